//! Loading of 28x28 grayscale pixel grids.
//!
//! The canonical source is a plain text dump of 784 whitespace-separated values in [0, 1]
//! (one MNIST digit, row-major). Every value is scaled by 255 so the grid holds intensities
//! in [0, 255]. `.npy` arrays, small images and MNIST idx3 files are accepted as well,
//! see [`load_grid_at`].
use crate::ImagePrecision;
use image::{GrayImage, ImageError};
use log::debug;
use ndarray::{Array, Array2, ArrayD, ShapeError};
use ndarray_npy::{read_npy, ReadNpyError};
use nshare::ToNdarray2;
use std::{ffi::OsStr, fs, path::Path};
use thiserror::Error;

pub const GRID_HEIGHT: usize = 28;
pub const GRID_WIDTH: usize = 28;
pub const GRID_LEN: usize = GRID_HEIGHT * GRID_WIDTH;

/// Magic number of an idx3 file holding unsigned bytes (MNIST images)
const IDX3_MAGIC: u32 = 0x0000_0803;
const IDX3_HEADER_LEN: usize = 16;

/// Applied to every value coming from a normalized ([0, 1]) source.
pub const PIXEL_SCALE: ImagePrecision = 255.0;

/// Row-major grid of grayscale intensities, always of shape (GRID_HEIGHT, GRID_WIDTH)
pub type PixelGrid = Array2<ImagePrecision>;

pub type GridResult<T> = Result<T, GridError>;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("Grid file not readable. Filesystem reported error\n {0}.")]
    Io(#[from] std::io::Error),
    #[error("Token {index} ({token:?}) is not a number.")]
    Parse { index: usize, token: String },
    #[error("Cannot reshape {found} values into a 28x28 grid, exactly {expected} are required.")]
    Shape { expected: usize, found: usize },
    #[error("Image has dimensions {found:?} (height, width), expected {expected:?}.")]
    Dimensions {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("Wrong shape for grid:\n {0}.")]
    Reshape(#[from] ShapeError),
    #[error("Npy file not readable:\n {0}.")]
    Npy(#[from] ReadNpyError),
    #[error("Image not decodable:\n {0}.")]
    Image(#[from] ImageError),
    #[error("Idx file not readable: {0}.")]
    Idx(String),
    #[error("Digit {index} requested, but the file holds {count}.")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("Unsupported grid format {0:?}. Only .txt, .npy, .png, .jpg and idx3-ubyte are supported.")]
    UnsupportedFormat(String),
}

/// Parses a whitespace-separated dump of 784 numbers into a scaled grid.
///
/// Tokens are parsed in order, the first one that is not a number is reported.
/// A wrong token count is an error; nothing is truncated or padded.
pub fn parse_grid(text: &str) -> GridResult<PixelGrid> {
    let flat = text
        .split_whitespace()
        .enumerate()
        .map(|(index, token)| {
            token
                .parse::<ImagePrecision>()
                .map(|v| v * PIXEL_SCALE)
                .map_err(|_| GridError::Parse {
                    index,
                    token: token.to_string(),
                })
        })
        .collect::<GridResult<Vec<_>>>()?;

    debug!("Parsed {} pixel values", flat.len());
    reshape(flat)
}

/// Reads a text dump from disk, see [`parse_grid`].
pub fn read_grid<P: AsRef<Path>>(path: P) -> GridResult<PixelGrid> {
    let raw_file = fs::read_to_string(path)?;
    parse_grid(&raw_file)
}

/// Reads an npy array holding 784 normalized values, stored as f32 or f64.
/// The stored shape is ignored, only the element count and their logical order matter.
pub fn read_grid_npy<P: AsRef<Path>>(path: P) -> GridResult<PixelGrid> {
    let path = path.as_ref();
    let flat: Vec<ImagePrecision> = match read_npy::<_, ArrayD<ImagePrecision>>(path) {
        Ok(arr) => {
            debug!("Read f32 npy array of shape {:?}", arr.shape());
            arr.iter().map(|v| v * PIXEL_SCALE).collect()
        }
        // numpy stores python floats as <f8
        Err(ReadNpyError::WrongDescriptor(_)) => {
            let arr: ArrayD<f64> = read_npy(path)?;
            debug!("Read f64 npy array of shape {:?}", arr.shape());
            arr.iter()
                .map(|&v| (v * f64::from(PIXEL_SCALE)) as ImagePrecision)
                .collect()
        }
        Err(e) => return Err(e.into()),
    };
    reshape(flat)
}

/// Reads a 28x28 image. Luma values are already intensities, so no scaling happens.
pub fn read_grid_image<P: AsRef<Path>>(path: P) -> GridResult<PixelGrid> {
    let img = image::io::Reader::open(path)?.decode()?.to_luma8();
    let (width, height) = img.dimensions();
    let found = (height as usize, width as usize);
    if found != (GRID_HEIGHT, GRID_WIDTH) {
        return Err(GridError::Dimensions {
            expected: (GRID_HEIGHT, GRID_WIDTH),
            found,
        });
    }
    Ok(img.into_ndarray2().mapv(ImagePrecision::from))
}

/// Reads digit `index` from an MNIST idx3 image file.
/// Bytes are already intensities, so no scaling happens.
///
/// Layout: magic 0x00000803, image count, rows, cols (big-endian u32 each),
/// then count * rows * cols bytes, row-major.
pub fn read_grid_idx<P: AsRef<Path>>(path: P, index: usize) -> GridResult<PixelGrid> {
    let bytes = fs::read(path)?;
    if bytes.len() < IDX3_HEADER_LEN {
        return Err(GridError::Idx(format!(
            "expected at least {} header bytes, got {}",
            IDX3_HEADER_LEN,
            bytes.len()
        )));
    }

    let header: Vec<u32> = bytes[..IDX3_HEADER_LEN]
        .chunks_exact(4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    if header[0] != IDX3_MAGIC {
        return Err(GridError::Idx(format!(
            "magic number {:#010x}, expected {:#010x}",
            header[0], IDX3_MAGIC
        )));
    }

    let (count, rows, cols) = (header[1] as usize, header[2] as usize, header[3] as usize);
    if (rows, cols) != (GRID_HEIGHT, GRID_WIDTH) {
        return Err(GridError::Dimensions {
            expected: (GRID_HEIGHT, GRID_WIDTH),
            found: (rows, cols),
        });
    }
    if index >= count {
        return Err(GridError::IndexOutOfRange { index, count });
    }

    let start = IDX3_HEADER_LEN + index * GRID_LEN;
    let pixels = bytes.get(start..start + GRID_LEN).ok_or_else(|| {
        GridError::Idx(format!(
            "header declares {} images, but the file is only {} bytes",
            count,
            bytes.len()
        ))
    })?;
    debug!("Read digit {} of {} from idx file", index, count);
    reshape(pixels.iter().map(|&p| ImagePrecision::from(p)).collect())
}

fn is_idx3(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .map_or(false, |name| name.ends_with("idx3-ubyte"))
}

/// Loads the first digit of a file, see [`load_grid_at`].
pub fn load_grid<P: AsRef<Path>>(path: P) -> GridResult<PixelGrid> {
    load_grid_at(path, 0)
}

/// Loads digit `index`, picking the reader from the file name.
///
/// Names ending in `idx3-ubyte` are MNIST image files and may hold many digits.
/// Every other source holds exactly one, so only index 0 is valid there.
/// Files without extension are treated as text dumps.
pub fn load_grid_at<P: AsRef<Path>>(path: P, index: usize) -> GridResult<PixelGrid> {
    let path = path.as_ref();
    if is_idx3(path) {
        return read_grid_idx(path, index);
    }
    if index > 0 {
        return Err(GridError::IndexOutOfRange { index, count: 1 });
    }
    match path.extension().and_then(OsStr::to_str) {
        None | Some("txt") => read_grid(path),
        Some("npy") => read_grid_npy(path),
        Some("png") | Some("jpg") | Some("jpeg") => read_grid_image(path),
        Some(other) => Err(GridError::UnsupportedFormat(other.to_string())),
    }
}

fn reshape(flat: Vec<ImagePrecision>) -> GridResult<PixelGrid> {
    if flat.len() != GRID_LEN {
        return Err(GridError::Shape {
            expected: GRID_LEN,
            found: flat.len(),
        });
    }
    Ok(Array::from_shape_vec((GRID_HEIGHT, GRID_WIDTH), flat)?)
}

/// Turns an intensity into a pixel value, clamping to the displayable range
fn to_pixel(x: &ImagePrecision) -> u8 {
    x.round().clamp(0.0, 255.0) as u8
}

/// Turns the grid into an 8-bit grayscale image of the same height and width
pub fn grid_to_image(grid: &PixelGrid) -> GrayImage {
    let (height, width) = grid.dim();
    let raw = grid.iter().map(to_pixel).collect();

    GrayImage::from_raw(width as u32, height as u32, raw)
        .expect("container should have the right size for the image dimensions")
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;

    use super::*;
    use image::Luma;
    use ndarray::{array, Array1};
    use tempfile::tempdir;

    fn dump(values: &[&str]) -> String {
        values.join(" ")
    }

    #[test]
    fn test_ones_scale_to_white() {
        let text = dump(&vec!["1.0"; GRID_LEN]);
        let grid = parse_grid(&text).unwrap();

        assert_eq!(grid.dim(), (GRID_HEIGHT, GRID_WIDTH));
        assert!(grid.iter().all(|&v| v == 255.0));
    }

    #[test]
    fn test_row_major_order() {
        let text: Vec<String> = (0..GRID_LEN).map(|i| (i as f32 / 1000.).to_string()).collect();
        let grid = parse_grid(&text.join("\n")).unwrap();

        assert!((grid[[0, 1]] - 0.001 * 255.).abs() < 1e-3);
        assert!((grid[[1, 0]] - 0.028 * 255.).abs() < 1e-3);
        assert!((grid[[27, 27]] - 0.783 * 255.).abs() < 1e-3);
    }

    #[test]
    fn test_mixed_whitespace_and_integers() {
        let mut text = String::new();
        for i in 0..GRID_LEN {
            text.push_str(if i % 2 == 0 { "0" } else { "0.5" });
            text.push(if i % 28 == 27 { '\n' } else { '\t' });
        }
        let grid = parse_grid(&text).unwrap();

        assert_eq!(grid[[0, 0]], 0.);
        assert_eq!(grid[[0, 1]], 127.5);
    }

    #[test]
    fn test_too_few_tokens() {
        let text = dump(&vec!["1"; GRID_LEN - 1]);
        match parse_grid(&text) {
            Err(GridError::Shape { expected, found }) => {
                assert_eq!(expected, GRID_LEN);
                assert_eq!(found, GRID_LEN - 1);
            }
            other => panic!("expected shape error, got {:?}", other),
        }
    }

    #[test]
    fn test_too_many_tokens() {
        let text = dump(&vec!["1"; GRID_LEN + 1]);
        assert!(matches!(
            parse_grid(&text),
            Err(GridError::Shape { found, .. }) if found == GRID_LEN + 1
        ));
    }

    #[test]
    fn test_bad_token() {
        let mut values = vec!["0.1"; GRID_LEN];
        values[3] = "0.x";
        match parse_grid(&dump(&values)) {
            Err(GridError::Parse { index, token }) => {
                assert_eq!(index, 3);
                assert_eq!(token, "0.x");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_read_grid_from_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("data.txt");
        let mut file = File::create(&file_path).unwrap();
        for _ in 0..GRID_HEIGHT {
            writeln!(file, "{}", dump(&vec!["0.2"; GRID_WIDTH])).unwrap();
        }

        let grid = load_grid(&file_path).unwrap();
        assert!(grid.iter().all(|&v| (v - 51.).abs() < 1e-4));

        drop(file);
        dir.close().unwrap();
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let res = read_grid(dir.path().join("data.txt"));
        assert!(matches!(res, Err(GridError::Io(_))));
    }

    #[test]
    fn test_npy_grid() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("digit.npy");
        let flat: Array1<f32> = Array::from_elem(GRID_LEN, 0.5);
        ndarray_npy::write_npy(&file_path, &flat).unwrap();

        let grid = load_grid(&file_path).unwrap();
        assert_eq!(grid.dim(), (GRID_HEIGHT, GRID_WIDTH));
        assert!(grid.iter().all(|&v| v == 127.5));

        dir.close().unwrap();
    }

    #[test]
    fn test_npy_f64_grid() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("digit.npy");
        let flat: Array2<f64> = Array::from_elem((GRID_HEIGHT, GRID_WIDTH), 0.5);
        ndarray_npy::write_npy(&file_path, &flat).unwrap();

        let grid = load_grid(&file_path).unwrap();
        assert!(grid.iter().all(|&v| v == 127.5));

        dir.close().unwrap();
    }

    #[test]
    fn test_npy_wrong_dtype() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("digit.npy");
        let flat: Array1<i64> = Array::from_elem(GRID_LEN, 1);
        ndarray_npy::write_npy(&file_path, &flat).unwrap();

        assert!(matches!(read_grid_npy(&file_path), Err(GridError::Npy(_))));

        dir.close().unwrap();
    }

    #[test]
    fn test_npy_wrong_count() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("digit.npy");
        let arr: Array2<f32> = array![[1., 2.], [3., 4.]];
        ndarray_npy::write_npy(&file_path, &arr).unwrap();

        assert!(matches!(
            read_grid_npy(&file_path),
            Err(GridError::Shape { found: 4, .. })
        ));

        dir.close().unwrap();
    }

    #[test]
    fn test_image_grid() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("digit.png");
        let mut img = GrayImage::new(GRID_WIDTH as u32, GRID_HEIGHT as u32);
        img.put_pixel(3, 1, Luma([200]));
        img.save(&file_path).unwrap();

        let grid = load_grid(&file_path).unwrap();
        assert_eq!(grid[[1, 3]], 200.);
        assert_eq!(grid[[3, 1]], 0.);

        dir.close().unwrap();
    }

    #[test]
    fn test_image_wrong_dimensions() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("digit.png");
        GrayImage::new(10, 20).save(&file_path).unwrap();

        match read_grid_image(&file_path) {
            Err(GridError::Dimensions { found, .. }) => assert_eq!(found, (20, 10)),
            other => panic!("expected dimension error, got {:?}", other),
        }

        dir.close().unwrap();
    }

    fn idx3_bytes(count: u32, rows: u32, cols: u32, pixels: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for v in &[IDX3_MAGIC, count, rows, cols] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.extend_from_slice(pixels);
        bytes
    }

    #[test]
    fn test_idx_grid() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("train-images-idx3-ubyte");
        let mut pixels = vec![0u8; 2 * GRID_LEN];
        pixels[5] = 17;
        pixels[GRID_LEN + GRID_WIDTH] = 255;
        std::fs::write(&file_path, idx3_bytes(2, 28, 28, &pixels)).unwrap();

        let first = load_grid(&file_path).unwrap();
        assert_eq!(first[[0, 5]], 17.);
        assert_eq!(first.sum(), 17.);

        let second = load_grid_at(&file_path, 1).unwrap();
        assert_eq!(second[[1, 0]], 255.);
        assert_eq!(second.sum(), 255.);

        assert!(matches!(
            load_grid_at(&file_path, 2),
            Err(GridError::IndexOutOfRange { index: 2, count: 2 })
        ));

        dir.close().unwrap();
    }

    #[test]
    fn test_idx_bad_header() {
        let dir = tempdir().unwrap();

        let short = dir.path().join("short.idx3-ubyte");
        std::fs::write(&short, [0u8; 8]).unwrap();
        assert!(matches!(load_grid(&short), Err(GridError::Idx(_))));

        let labels = dir.path().join("labels.idx3-ubyte");
        let mut bytes = idx3_bytes(1, 28, 28, &[0u8; GRID_LEN]);
        bytes[3] = 0x01;
        std::fs::write(&labels, bytes).unwrap();
        assert!(matches!(load_grid(&labels), Err(GridError::Idx(_))));

        let small = dir.path().join("small.idx3-ubyte");
        std::fs::write(&small, idx3_bytes(1, 8, 8, &[0u8; 64])).unwrap();
        assert!(matches!(
            load_grid(&small),
            Err(GridError::Dimensions { found: (8, 8), .. })
        ));

        let truncated = dir.path().join("truncated.idx3-ubyte");
        std::fs::write(&truncated, idx3_bytes(3, 28, 28, &[0u8; GRID_LEN])).unwrap();
        assert!(load_grid_at(&truncated, 0).is_ok());
        assert!(matches!(load_grid_at(&truncated, 1), Err(GridError::Idx(_))));

        dir.close().unwrap();
    }

    #[test]
    fn test_single_digit_sources_reject_index() {
        assert!(matches!(
            load_grid_at("data.txt", 1),
            Err(GridError::IndexOutOfRange { index: 1, count: 1 })
        ));
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(matches!(
            load_grid("digit.bmp"),
            Err(GridError::UnsupportedFormat(ext)) if ext == "bmp"
        ));
    }

    #[test]
    fn test_grid_to_image() {
        let grid = array![[-3., 0.4], [127.6, 300.]];
        let img = grid_to_image(&grid);

        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 0), &Luma([0]));
        assert_eq!(img.get_pixel(1, 0), &Luma([0]));
        assert_eq!(img.get_pixel(0, 1), &Luma([128]));
        assert_eq!(img.get_pixel(1, 1), &Luma([255]));
    }
}
