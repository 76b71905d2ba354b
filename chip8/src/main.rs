use std::error::Error;

use clap::Parser;

use chip8::args::Args;
use chip8::run::run;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    run(Args::parse())
}
