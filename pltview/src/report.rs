use std::io::{self, Write};
use std::path::PathBuf;

/// Writes the "nothing to launch" diagnostic, listing probes in order.
pub fn write_not_found<W: Write>(
    out: &mut W,
    binary_name: &str,
    probed: &[PathBuf],
) -> io::Result<()> {
    writeln!(out, "Error: {binary_name} binary not found!")?;
    writeln!(out, "Searched in:")?;
    if probed.is_empty() {
        writeln!(out, "  (no candidate locations configured)")?;
    }
    for path in probed {
        writeln!(out, "  - {}", path.display())?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Try reinstalling the {binary_name} package, or rebuild the viewer with pltview-build."
    )?;
    out.flush()
}

/// Prints the diagnostic to stderr in one write so it is never interleaved.
pub fn report_not_found(binary_name: &str, probed: &[PathBuf]) -> io::Result<()> {
    let mut buffer = Vec::new();
    write_not_found(&mut buffer, binary_name, probed)?;
    let mut stderr = io::stderr().lock();
    stderr.write_all(&buffer)?;
    stderr.flush()
}
