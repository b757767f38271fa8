use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::fmt::MakeWriter;

/// Appending log file writer for tracing-subscriber.
///
/// The file is reopened per event so rotation by an external tool is picked up.
pub struct FileWriter {
    path: PathBuf,
}

impl FileWriter {
    pub fn new(path: PathBuf) -> Self {
        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                eprintln!(
                    "causal: failed to create log directory {}: {}",
                    parent.display(),
                    err
                );
            }
        }
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl<'a> MakeWriter<'a> for FileWriter {
    type Writer = Box<dyn Write + Send + Sync + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(file) => Box::new(std::io::BufWriter::new(file)),
            // Emitting a tracing event here would recurse into this writer
            Err(_) => Box::new(std::io::BufWriter::new(std::io::stderr())),
        }
    }
}
