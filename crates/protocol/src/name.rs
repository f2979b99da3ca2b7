use std::path::{Component, Path};

use crate::error::ProtocolError;

/// Validates a peer-supplied file name before it is joined onto a local
/// directory.
///
/// The name must be exactly one plain path component. Rejects:
/// - Empty names, `.` and `..`
/// - Any `/` or `\` separator (so no traversal and no subdirectories)
/// - Absolute paths and Windows prefixes (`C:`, `\\server`)
/// - NUL bytes
pub fn validate_file_name(name: &str) -> Result<(), ProtocolError> {
    if name.is_empty() {
        return Err(ProtocolError::InvalidName("empty name".into()));
    }

    if name.contains('\0') {
        return Err(ProtocolError::InvalidName(format!(
            "NUL byte not allowed: {name:?}"
        )));
    }

    if name.contains(['/', '\\']) {
        return Err(ProtocolError::InvalidName(format!(
            "path separator not allowed: {name}"
        )));
    }

    // Drive-relative names like `C:evil` carry no separator.
    if name.len() >= 2 && name.as_bytes()[1] == b':' && name.as_bytes()[0].is_ascii_alphabetic() {
        return Err(ProtocolError::InvalidName(format!(
            "drive prefix not allowed: {name}"
        )));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        (Some(Component::ParentDir), None) | (Some(Component::CurDir), None) => Err(
            ProtocolError::InvalidName(format!("directory reference not allowed: {name}")),
        ),
        _ => Err(ProtocolError::InvalidName(format!(
            "not a plain file name: {name}"
        ))),
    }
}
