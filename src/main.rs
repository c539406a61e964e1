mod launch;
mod validate;

use launch::RootCommand;

fn main() {
    let command: RootCommand = argh::from_env();

    if let Err(code) = command.run() {
        std::process::exit(code);
    }
}
