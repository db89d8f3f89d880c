//! Archive fixture builders
//!
//! Produces `.tar.gz` files shaped like the MaxMind downloads:
//! `GeoLite2-City_20240115/GeoLite2-City.mmdb` plus license files.

use flate2::write::GzEncoder;
use flate2::Compression;
use geoip2_core::Edition;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::constants::*;

/// Write a gzipped tarball containing `entries` (path, content)
pub fn create_tar_gz(archive_path: &Path, entries: &[(&str, &[u8])]) -> PathBuf {
    let file = File::create(archive_path).unwrap();
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *content).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap();
    archive_path.to_path_buf()
}

/// Name of the dated wrapper folder MaxMind uses
pub fn wrapper_name(edition: Edition, date: &str) -> String {
    format!("{}_{}", edition, date.replace('-', ""))
}

/// Realistic database archive for `edition` released on `date`
pub fn create_database_archive(dir: &Path, edition: Edition, date: &str) -> PathBuf {
    let wrapper = wrapper_name(edition, date);
    let mmdb = format!("{}/{}.mmdb", wrapper, edition);
    let license = format!("{}/LICENSE.txt", wrapper);

    create_tar_gz(
        &dir.join(format!("{}.tar.gz", wrapper)),
        &[(mmdb.as_str(), MMDB_CONTENT), (license.as_str(), LICENSE_CONTENT)],
    )
}

/// Archive bytes for `edition`, for serving from a mock server
pub fn database_archive_bytes(edition: Edition, date: &str) -> Vec<u8> {
    let temp = tempfile::TempDir::new().unwrap();
    let path = create_database_archive(temp.path(), edition, date);
    std::fs::read(path).unwrap()
}
