use clap::{Parser, Subcommand};

mod config;
mod generate;
mod validate;

#[derive(Parser, Debug)]
#[command(name = "harmonics", version, about = "Harmonics batch generator CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score input files and write `<name>_generated.txt` next to each
    Generate(generate::GenerateArgs),
    /// Parse and normalize input files without scoring
    Validate(validate::ValidateArgs),
    /// Print the effective configuration as TOML
    Config(config::ShowArgs),
}

impl Cli {
    pub fn dispatch(self) -> anyhow::Result<()> {
        match self.command {
            Command::Generate(args) => generate::handle(args),
            Command::Validate(args) => validate::handle(args),
            Command::Config(args) => config::handle(args),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/cli/mod.rs"]
mod tests;
