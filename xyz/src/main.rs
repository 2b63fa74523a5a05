use crate::cmd::{init_logger, Args};
use clap::Parser;
use std::process;

mod cmd;

fn main() {
    let args = Args::parse();
    init_logger(args.log_level);

    // A user interrupt is a silent, non-error exit.
    let _ = ctrlc::set_handler(|| process::exit(0));

    if let Err(e) = cmd::run(args) {
        if let Some(engine) = e.downcast_ref::<packsys::Error>() {
            if engine.is_usage() {
                eprintln!("{}", engine);
                process::exit(1);
            }
        }
        eprintln!("{:?}", e);
        process::exit(1);
    }
}
