//! Manifest output with highlighted document boundaries

use crate::ui::style::{MARKER, paint};
use std::io::{self, Write};

/// Writes manifests, colouring `---` separators and `# Source:` comments
pub struct ManifestColorWriter<W: Write> {
  out: W,
  color: bool,
}

impl<W: Write> ManifestColorWriter<W> {
  pub fn new(out: W, color: bool) -> Self {
    Self { out, color }
  }

  pub fn write_manifest(&mut self, manifest: &str) -> io::Result<()> {
    for line in manifest.split_inclusive('\n') {
      let (text, newline) = match line.strip_suffix('\n') {
        Some(text) => (text, "\n"),
        None => (line, ""),
      };
      if text.starts_with("---") || text.starts_with("# Source:") {
        write!(self.out, "{}{}", paint(MARKER, text, self.color), newline)?;
      } else {
        write!(self.out, "{}{}", text, newline)?;
      }
    }
    self.out.flush()
  }

  pub fn into_inner(self) -> W {
    self.out
  }
}
