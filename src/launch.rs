use std::io::IsTerminal;
use std::path::PathBuf;

use argh::FromArgs;
use bmc_scraper::config::Config;
use bmc_scraper::controller;
use bmc_scraper::output::{Console, Format, Output};
use bmc_scraper::scrape::Receiver;
use exitcode::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::validate;

#[derive(FromArgs)]
#[argh(
    description = "Poll a Redfish management controller and print its hardware metrics",
    help_triggers("-h", "--help")
)]
pub struct RootCommand {
    #[argh(switch, short = 'v', description = "show version")]
    version: bool,

    #[argh(
        option,
        short = 'l',
        default = "\"info\".to_string()",
        description = "log level"
    )]
    log_level: String,

    #[argh(
        option,
        short = 'c',
        long = "config",
        description = "read configuration from this YAML file"
    )]
    config: Option<PathBuf>,

    #[argh(
        option,
        short = 'f',
        default = "Format::Text",
        description = "output format of snapshots, text or json"
    )]
    format: Format,

    #[argh(switch, description = "scrape once, print the snapshot and exit")]
    once: bool,

    #[argh(subcommand)]
    sub_commands: Option<SubCommands>,
}

impl RootCommand {
    #![allow(clippy::print_stdout)]
    fn show_version(&self) {
        println!("bmc-scraper {}", bmc_scraper::get_version());
    }

    pub fn run(&self) -> Result<(), ExitCode> {
        if self.version {
            self.show_version();
            return Ok(());
        }

        if let Some(sub_command) = &self.sub_commands {
            return sub_command.run();
        }

        let log_level = std::env::var("BMC_SCRAPER_LOG")
            .unwrap_or_else(|_| framework::trace::levels_for(&self.log_level));
        let color = std::io::stdout().is_terminal();
        framework::trace::init(color, false, &log_level);

        let config = match &self.config {
            Some(path) => Config::load(path),
            None => {
                let config = Config::default();
                config.validate().map(|_| config)
            }
        }
        .map_err(|err| {
            error!(message = "load config failed", %err);
            exitcode::CONFIG
        })?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("bmc-scraper-worker")
            .enable_io()
            .enable_time()
            .build()
            .map_err(|err| {
                error!(message = "build tokio runtime failed", %err);
                exitcode::OSERR
            })?;

        let format = self.format;
        let once = self.once;

        runtime.block_on(async move {
            info!(
                message = "start bmc-scraper",
                version = bmc_scraper::get_version(),
                endpoint = %config.endpoint,
                once,
            );

            let shutdown = CancellationToken::new();
            framework::signal::shutdown_on_signal(shutdown.clone());

            let mut receiver = Receiver::new(config);
            let mut console = Console::stdout(format);

            if once {
                let Some(snapshot) = controller::cycle(&mut receiver, &shutdown).await else {
                    info!(message = "scrape cancelled");
                    return Ok(());
                };

                receiver.shutdown();

                return console.send(snapshot).await.map_err(|err| {
                    error!(message = "write snapshot failed", %err);
                    exitcode::IOERR
                });
            }

            controller::run(receiver, &mut console, shutdown)
                .await
                .map_err(|err| {
                    error!(message = "scraper exited with error", %err);
                    exitcode::SOFTWARE
                })
        })
    }
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommands {
    Validate(validate::Validate),
}

impl SubCommands {
    fn run(&self) -> Result<(), ExitCode> {
        match self {
            SubCommands::Validate(validate) => match validate.run() {
                exitcode::OK => Ok(()),
                code => Err(code),
            },
        }
    }
}
