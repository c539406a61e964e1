use std::path::PathBuf;

use argh::FromArgs;
use bmc_scraper::config::Config;
use exitcode::ExitCode;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(
    subcommand,
    name = "validate",
    description = "Validate the config file, then exit"
)]
pub struct Validate {
    #[argh(option, short = 'c', description = "the config file to validate")]
    config: PathBuf,
}

impl Validate {
    #![allow(clippy::print_stdout)]
    pub fn run(&self) -> ExitCode {
        match Config::load(&self.config) {
            Ok(config) => {
                println!("√ Loaded {:?}", self.config);
                println!("  endpoint {}", config.endpoint);
                println!("  interval {:?}, timeout {:?}", config.interval, config.timeout);

                exitcode::OK
            }
            Err(err) => {
                println!("x {err}");

                exitcode::CONFIG
            }
        }
    }
}
