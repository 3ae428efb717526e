/// File write disposition for one append of decoded rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteMode {
    /// Emit the header record before the rows.
    pub header: bool,
    /// Append to the existing file instead of replacing it.
    pub append: bool,
}

/// Write-mode policy for the delimited output file.
///
/// The observed data-row count of the target file is authoritative, not
/// any flag the engine carries: a file emptied externally between retries
/// gets its header back via a full overwrite, and a file that already
/// holds rows is only ever appended to, headerless.
pub fn write_mode_for(existing_rows: u64) -> WriteMode {
    if existing_rows == 0 {
        WriteMode {
            header: true,
            append: false,
        }
    } else {
        WriteMode {
            header: false,
            append: true,
        }
    }
}
