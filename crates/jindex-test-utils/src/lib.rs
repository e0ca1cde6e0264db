//! Utilities shared by jindex tests.
//!
//! [`ClassFileBuilder`] synthesizes class-file bytes so decoder and indexer
//! tests do not need a Java toolchain; [`write_jar`] packs them into an archive.

mod class_builder;

pub use class_builder::{
    AnnotationSpec, ClassFileBuilder, CodeSpec, ConstantSpec, ElementSpec, FieldSpec, MethodSpec,
    TypeAnnotationSpec,
};

use std::io::Write;
use std::path::Path;

/// Writes a zip archive containing `entries` (name, bytes) in order.
pub fn write_jar(path: &Path, entries: &[(&str, &[u8])]) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default();
    for (name, bytes) in entries {
        zip.start_file(*name, options)?;
        zip.write_all(bytes)?;
    }
    zip.finish()?;
    Ok(())
}
