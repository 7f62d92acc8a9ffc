use std::path::PathBuf;

use clap::Args;

use crate::config::GenerateConfig;
use crate::config::loader::{load_or_default, render_config, validate_config};

/// Configuration flags shared by every subcommand. Flags win over the file.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Optional TOML configuration file
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// Raw lines per batch
    #[arg(long)]
    pub(crate) chunk_size: Option<usize>,

    /// ONNX model artifact
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,

    /// onnxruntime shared library (defaults to the bundled one for this platform)
    #[arg(long)]
    pub(crate) runtime_library: Option<PathBuf>,

    /// Keep one inference session for the whole run
    #[arg(long)]
    pub(crate) reuse_session: bool,
}

impl ConfigArgs {
    pub fn resolve(&self) -> anyhow::Result<GenerateConfig> {
        let mut config = load_or_default(self.config.as_deref())?;
        if let Some(chunk_size) = self.chunk_size {
            config.batch.chunk_size = chunk_size;
        }
        if let Some(model) = &self.model {
            config.scorer.model = model.clone();
        }
        if let Some(library) = &self.runtime_library {
            config.scorer.runtime_library = Some(library.clone());
        }
        if self.reuse_session {
            config.scorer.reuse_session = true;
        }
        validate_config(&config)?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    config: ConfigArgs,
}

pub fn handle(args: ShowArgs) -> anyhow::Result<()> {
    let config = args.config.resolve()?;
    print!("{}", render_config(&config)?);
    Ok(())
}
