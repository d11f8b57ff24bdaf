//! Both fetch strategies must decode the same archive bytes into the same
//! in-memory tile.

use gpsinfo_tiles::{ArchiveFetcher, DatasetConfig, StreamingFetcher, TileIndex, TileSpec};
use std::io::Write;

fn tiny_spec() -> TileSpec {
    TileSpec {
        ncols: 3,
        nrows: 2,
        xll: 0.0,
        yll: 0.0,
        ..TileSpec::default()
    }
}

/// Build a tile archive the way the server lays them out: one `.asc` entry
/// under the layer's `_TILED` prefix.
fn tile_archive(config: &DatasetConfig, index: TileIndex, asc: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer
        .start_file(
            config.entry_path(index),
            zip::write::SimpleFileOptions::default(),
        )
        .unwrap();
    writer.write_all(asc.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

const TINY_ASC: &str = "ncols 3\n\
                        nrows 2\n\
                        xllcorner 4500\n\
                        yllcorner 3000\n\
                        cellsize 10\n\
                        NODATA_value -99999\n\
                        10.5 11 12\n\
                        13 -99999 15\n";

#[test]
fn strategies_decode_identical_tiles() {
    let spec = tiny_spec();
    let config = DatasetConfig {
        spec: spec.clone(),
        ..DatasetConfig::default()
    };
    let index = TileIndex::new(3, 2);
    let bytes = tile_archive(&config, index, TINY_ASC);

    let streamed = StreamingFetcher::decode_stream(bytes.as_slice(), &spec).unwrap();
    let unpacked = ArchiveFetcher::decode_archive(&bytes, &spec).unwrap();

    assert_eq!(streamed, unpacked);
    assert_eq!(streamed.geotransform(), unpacked.geotransform());
    assert_eq!(streamed.value(1, 1), spec.nodata);
}

#[test]
fn stream_decoding_rejects_archives_without_grid_entry() {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer
        .start_file("readme.txt", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"not a grid").unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let err = StreamingFetcher::decode_stream(bytes.as_slice(), &tiny_spec()).unwrap_err();
    assert!(matches!(
        err,
        gpsinfo_tiles::TileError::MalformedGrid(_)
    ));
}
