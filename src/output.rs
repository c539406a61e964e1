use std::io::Write;
use std::str::FromStr;

use event::Snapshot;

/// Somewhere finished snapshots go.
#[async_trait::async_trait]
pub trait Output: Send {
    async fn send(&mut self, snapshot: Snapshot) -> crate::Result<()>;
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Format {
    #[default]
    Text,
    Json,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            _ => Err(format!("unknown format {s:?}, text or json expected")),
        }
    }
}

/// Writes snapshots to stdout, or any other writer.
pub struct Console<W = std::io::Stdout> {
    format: Format,
    writer: W,
}

impl Console {
    pub fn stdout(format: Format) -> Self {
        Console {
            format,
            writer: std::io::stdout(),
        }
    }
}

impl<W: Write> Console<W> {
    pub fn new(format: Format, writer: W) -> Self {
        Console { format, writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write(&mut self, snapshot: &Snapshot) -> crate::Result<()> {
        match self.format {
            Format::Text => write!(self.writer, "{snapshot}")?,
            Format::Json => {
                serde_json::to_writer(&mut self.writer, snapshot)?;
                self.writer.write_all(b"\n")?;
            }
        }

        self.writer.flush()?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl<W: Write + Send> Output for Console<W> {
    async fn send(&mut self, snapshot: Snapshot) -> crate::Result<()> {
        self.write(&snapshot)
    }
}
