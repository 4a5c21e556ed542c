mod common;

use common::{grid, scratch};
use geoio::{
    read_raster, read_raster_header, render_band, write_raster, Compression, Crs, GeoIoError,
    RasterBand, RasterDataset, RasterReadOptions, RasterWriteOptions, StorageType,
};
use ndarray::Array2;
use rstest::rstest;
use tempfile::TempDir;

#[rstest]
#[test_log::test]
fn geotiff_keeps_every_band(scratch: TempDir) {
    let path = scratch.path().join("dem.tif");
    let written = grid(4, 3, 3);
    write_raster(&written, &path, &RasterWriteOptions::default()).unwrap();

    let read = read_raster(&path, &RasterReadOptions::default().all_bands()).unwrap();
    assert_eq!(read.band_count(), 3);
    assert_eq!(read.header().shape(), (3, 4));
    assert_eq!(read.header().origin(), (135.0, 36.0));
    assert_eq!(read.header().resolution(), (0.01, -0.01));
    assert_eq!(read.header().crs, Crs::Epsg(4326));
    for (read, written) in read.bands().iter().zip(written.bands()) {
        assert_eq!(read.values, written.values);
        assert_eq!(read.description, written.description);
    }
}

#[rstest]
#[test_log::test]
fn selects_a_single_band(scratch: TempDir) {
    let path = scratch.path().join("dem.tif");
    let written = grid(4, 3, 3);
    write_raster(&written, &path, &RasterWriteOptions::default()).unwrap();

    let read = read_raster(&path, &RasterReadOptions::default().band(2)).unwrap();
    assert_eq!(read.band_count(), 1);
    assert_eq!(read.band(1).unwrap().values, written.band(2).unwrap().values);

    let first = read_raster(&path, &RasterReadOptions::default()).unwrap();
    assert_eq!(first.band(1).unwrap().values, written.band(1).unwrap().values);
}

#[rstest]
#[case(0)]
#[case(4)]
#[test_log::test]
fn band_beyond_count_is_out_of_range(scratch: TempDir, #[case] band: usize) {
    let path = scratch.path().join("dem.tif");
    write_raster(&grid(4, 3, 3), &path, &RasterWriteOptions::default()).unwrap();

    let err = read_raster(&path, &RasterReadOptions::default().band(band)).unwrap_err();
    match err {
        GeoIoError::BandIndexOutOfRange {
            requested,
            available,
            ..
        } => {
            assert_eq!(requested, band);
            assert_eq!(available, 3);
        }
        other => panic!("unexpected {other}"),
    }
}

#[rstest]
#[test_log::test]
fn header_reads_without_cells(scratch: TempDir) {
    let path = scratch.path().join("dem.tif");
    write_raster(&grid(5, 2, 2), &path, &RasterWriteOptions::default()).unwrap();

    let summary = read_raster_header(&path, &RasterReadOptions::default()).unwrap();
    assert_eq!(summary.band_count, 2);
    assert_eq!(summary.driver, "GTiff");
    assert_eq!((summary.header.width, summary.header.height), (5, 2));
}

#[rstest]
#[case(StorageType::Int8)]
#[case(StorageType::UInt8)]
#[case(StorageType::Int16)]
#[case(StorageType::UInt16)]
#[case(StorageType::Int32)]
#[case(StorageType::UInt32)]
#[case(StorageType::Float32)]
#[case(StorageType::Float64)]
#[test_log::test]
fn storage_types_hold_small_integers(scratch: TempDir, #[case] storage: StorageType) {
    let path = scratch.path().join("dem.tif");
    let written = grid(4, 3, 1);
    let options = RasterWriteOptions::default()
        .storage(storage)
        .compression(Compression::Lzw);
    write_raster(&written, &path, &options).unwrap();

    let read = read_raster(&path, &RasterReadOptions::default()).unwrap();
    assert_eq!(read.band(1).unwrap().values, written.band(1).unwrap().values);
}

#[rstest]
#[test_log::test]
fn one_bit_storage_keeps_the_mask(scratch: TempDir) {
    let path = scratch.path().join("mask.tif");
    let header = grid(3, 2, 1).header().clone();
    let mask = Array2::from_shape_vec((2, 3), vec![0., 1., 0., 7., 0., -2.]).unwrap();
    let written = RasterDataset::from_bands(header, [RasterBand::new(mask)]).unwrap();
    let options = RasterWriteOptions::default().storage(StorageType::Bit1);
    write_raster(&written, &path, &options).unwrap();

    let read = read_raster(&path, &RasterReadOptions::default()).unwrap();
    assert_eq!(
        read.band(1).unwrap().values.iter().copied().collect::<Vec<_>>(),
        vec![0., 1., 0., 1., 0., 1.]
    );
}

#[rstest]
#[test_log::test]
fn no_data_is_preserved(scratch: TempDir) {
    let path = scratch.path().join("dem.tif");
    let header = grid(2, 2, 1).header().clone();
    let values = Array2::from_shape_vec((2, 2), vec![-9999., 12.5, 13., 14.]).unwrap();
    let band = RasterBand::new(values).with_no_data(-9999.);
    let written = RasterDataset::from_bands(header, [band]).unwrap();
    write_raster(&written, &path, &RasterWriteOptions::default()).unwrap();

    let read = read_raster(&path, &RasterReadOptions::default()).unwrap();
    let band = read.band(1).unwrap();
    assert_eq!(band.no_data, Some(-9999.));
    assert_eq!(band.range(), Some((12.5, 14.)));
}

#[rstest]
#[test_log::test]
fn ascii_grid_is_written_through_a_copy(scratch: TempDir) {
    let path = scratch.path().join("dem.asc");
    let written = grid(4, 4, 1);
    let options = RasterWriteOptions::default().storage(StorageType::Int32);
    write_raster(&written, &path, &options).unwrap();

    let summary = read_raster_header(&path, &RasterReadOptions::default()).unwrap();
    assert_eq!(summary.driver, "AAIGrid");
    let read = read_raster(&path, &RasterReadOptions::default()).unwrap();
    assert_eq!(read.header().shape(), (4, 4));
    assert_eq!(read.band(1).unwrap().values, written.band(1).unwrap().values);
}

#[rstest]
#[test_log::test]
fn grd_resolves_to_raster_grid(scratch: TempDir) {
    let path = scratch.path().join("dem.grd");
    let written = grid(3, 3, 2);
    write_raster(&written, &path, &RasterWriteOptions::default()).unwrap();

    let summary = read_raster_header(&path, &RasterReadOptions::default()).unwrap();
    assert_eq!(summary.driver, "RRASTER");
    assert_eq!(summary.band_count, 2);
}

#[rstest]
#[test_log::test]
fn existing_raster_requires_overwrite(scratch: TempDir) {
    let path = scratch.path().join("dem.tif");
    write_raster(&grid(4, 3, 1), &path, &RasterWriteOptions::default()).unwrap();

    let err = write_raster(&grid(2, 2, 1), &path, &RasterWriteOptions::default()).unwrap_err();
    assert!(matches!(err, GeoIoError::DestinationExists { .. }), "{err}");

    let overwrite = RasterWriteOptions::default().overwrite(true);
    write_raster(&grid(2, 2, 1), &path, &overwrite).unwrap();
    let summary = read_raster_header(&path, &RasterReadOptions::default()).unwrap();
    assert_eq!(summary.header.shape(), (2, 2));
}

#[rstest]
#[test_log::test]
fn truncated_raster_is_a_parse_error(scratch: TempDir) {
    let path = scratch.path().join("broken.tif");
    std::fs::write(&path, b"II*\0garbage").unwrap();
    let err = read_raster(&path, &RasterReadOptions::default()).unwrap_err();
    assert!(matches!(err, GeoIoError::ParseError { .. }), "{err}");

    let missing = scratch.path().join("missing.tif");
    let err = read_raster(&missing, &RasterReadOptions::default()).unwrap_err();
    assert!(matches!(err, GeoIoError::SourceNotFound { .. }), "{err}");
}

#[rstest]
#[test_log::test]
fn renders_a_quick_look(scratch: TempDir) {
    let raster_path = scratch.path().join("dem.tif");
    write_raster(&grid(8, 6, 2), &raster_path, &RasterWriteOptions::default()).unwrap();
    let read = read_raster(&raster_path, &RasterReadOptions::default().all_bands()).unwrap();

    let image_path = scratch.path().join("dem.png");
    render_band(&read, 2, &image_path).unwrap();
    let image = image::open(&image_path).unwrap().into_luma_alpha8();
    assert_eq!(image.dimensions(), (8, 6));
    assert_eq!(image.get_pixel(0, 0).0, [0, 255]);
    assert_eq!(image.get_pixel(7, 5).0, [255, 255]);
}

#[rstest]
#[case("signed.tif")]
#[case("signed.asc")]
#[test_log::test]
fn signed_bytes_keep_negative_values(scratch: TempDir, #[case] file_name: &str) {
    let path = scratch.path().join(file_name);
    let header = grid(3, 2, 1).header().clone();
    let values = Array2::from_shape_vec((2, 3), vec![-128., -1., 0., 1., 127., -50.]).unwrap();
    let written = RasterDataset::from_bands(header, [RasterBand::new(values)]).unwrap();
    let options = RasterWriteOptions::default().storage(StorageType::Int8);
    write_raster(&written, &path, &options).unwrap();

    let read = read_raster(&path, &RasterReadOptions::default()).unwrap();
    assert_eq!(read.band(1).unwrap().values, written.band(1).unwrap().values);
}

#[rstest]
#[test_log::test]
fn failed_raster_writes_name_the_destination(scratch: TempDir) {
    let path = scratch.path().join("missing").join("dem.tif");
    let err = write_raster(&grid(2, 2, 1), &path, &RasterWriteOptions::default()).unwrap_err();
    match err {
        GeoIoError::WriteError {
            destination,
            driver,
            ..
        } => {
            assert_eq!(destination, path.display().to_string());
            assert_eq!(driver, "GTiff");
        }
        other => panic!("unexpected {other}"),
    }
}
