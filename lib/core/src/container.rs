//! Zip-based tensor archives (`torch.save` layout)
//!
//! ```text
//! <prefix>/data.pkl      pickle program describing the object graph
//! <prefix>/byteorder     "little" or "big" (optional, defaults to little)
//! <prefix>/data/<key>    raw bytes of each storage
//! ```
//!
//! The pickle program is run by `candle_core::pickle`, which also resolves
//! tensor rebuild calls into a [`TensorInfo`]. Storage reads are checked
//! against the view before anything is allocated, so a corrupt header turns
//! into [`Error::Decode`] rather than an oversized buffer.

use crate::payload::{coerce_numeric, VectorPayload};
use crate::vector::{RawVector, FLAT_LEN};
use crate::{Error, Result};
use candle_core::pickle::{Object, Stack, TensorInfo};
use candle_core::{DType, Device, Tensor};
use ndarray::{ArrayD, IxDyn};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

pub struct TensorArchive<R> {
    zip: ZipArchive<R>,
    /// `<prefix>/data`, the pickle stem and the directory holding storages
    data_dir: String,
    path: PathBuf,
}

impl TensorArchive<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file), path)
    }
}

impl<R: Read + Seek> TensorArchive<R> {
    pub fn new(reader: R, path: &Path) -> Result<Self> {
        let mut zip = ZipArchive::new(reader)
            .map_err(|e| Error::decode(path, format!("not a zip tensor archive ({})", e)))?;

        let prefix = zip
            .file_names()
            .find_map(|name| name.strip_suffix("data.pkl").map(str::to_string))
            .ok_or_else(|| Error::decode(path, "archive has no data.pkl"))?;

        // storages are read as little-endian
        if let Ok(mut entry) = zip.by_name(&format!("{}byteorder", prefix)) {
            let mut order = String::new();
            entry
                .read_to_string(&mut order)
                .map_err(|e| Error::decode(path, e))?;
            if order.trim() == "big" {
                return Err(Error::decode(path, "big-endian archives are not supported"));
            }
        }

        Ok(Self {
            zip,
            data_dir: format!("{}data", prefix),
            path: path.to_path_buf(),
        })
    }

    fn entry_bytes(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self
            .zip
            .by_name(name)
            .map_err(|e| Error::decode(&self.path, format!("{}: {}", name, e)))?;
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| Error::decode(&self.path, e))?;
        Ok(bytes)
    }

    /// Decode the root object of the archive
    pub fn read_root(&mut self) -> Result<Object> {
        let entry = self
            .zip
            .by_name(&format!("{}.pkl", self.data_dir))
            .map_err(|e| Error::decode(&self.path, e))?;
        let mut reader = BufReader::new(entry);
        let mut stack = Stack::empty();
        stack
            .read_loop(&mut reader)
            .map_err(|e| Error::decode(&self.path, e))?;
        let root = stack.finalize().map_err(|e| Error::decode(&self.path, e))?;
        debug!(path = %self.path.display(), "Decoded archive root");
        Ok(root)
    }

    /// Read the storage behind `info` and gather its elements in row-major
    /// order, honouring offset and strides
    pub fn materialize(&mut self, info: &TensorInfo) -> Result<RawVector> {
        let width = info.dtype.size_in_bytes();
        let bytes = self.entry_bytes(&info.path)?;
        let storage_len = bytes.len() / width;

        let dims = info.layout.dims();
        let stride = info.layout.stride();
        // candle reports the view offset in bytes
        let offset = info.layout.start_offset() / width;
        let numel = check_view(dims, stride, offset, storage_len)
            .map_err(|reason| Error::decode(&self.path, reason))?;

        let storage = Tensor::from_raw_buffer(
            &bytes[..storage_len * width],
            info.dtype,
            &[storage_len],
            &Device::Cpu,
        )
        .and_then(|t| t.to_dtype(DType::F64))
        .and_then(|t| t.to_vec1::<f64>())
        .map_err(|e| Error::decode(&self.path, e))?;

        let mut values = Vec::with_capacity(numel);
        let mut index = vec![0usize; dims.len()];
        for _ in 0..numel {
            // bounded by check_view
            let pos = offset + index.iter().zip(stride).map(|(i, s)| i * s).sum::<usize>();
            values.push(storage[pos]);

            for axis in (0..index.len()).rev() {
                index[axis] += 1;
                if index[axis] < dims[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }

        ArrayD::from_shape_vec(IxDyn(dims), values)
            .map(RawVector::new)
            .map_err(|e| Error::decode(&self.path, e))
    }

    /// Load the latent carried by this archive
    pub fn read_latent(&mut self, preferred_key: Option<&str>) -> Result<RawVector> {
        let root = self.read_root()?;
        let path = self.path.clone();
        let value = VectorPayload::classify(root).select(preferred_key, &path)?;
        if let Some(array) = coerce_numeric(&value) {
            return Ok(RawVector::new(array));
        }

        let name = Object::Unicode("latent".to_string());
        match value.into_tensor_info(name, Path::new(&self.data_dir)) {
            Ok(Some(info)) => {
                debug!(
                    path = %path.display(),
                    dtype = ?info.dtype,
                    shape = ?info.layout.dims(),
                    "Tensor view"
                );
                self.materialize(&info)
            }
            Ok(None) => Err(Error::decode(&path, "value is neither a tensor nor numeric")),
            Err(e) => Err(Error::decode(&path, e)),
        }
    }
}

/// Validate a strided view against its storage and return its element count
///
/// Every index the view can reach must lie inside the storage. A view with
/// more elements than its storage (a stride-0 broadcast) is accepted only
/// up to the size of a W+ latent.
fn check_view(
    dims: &[usize],
    stride: &[usize],
    offset: usize,
    storage_len: usize,
) -> std::result::Result<usize, String> {
    if dims.len() != stride.len() {
        return Err("stride rank differs from shape rank".to_string());
    }
    let numel = dims
        .iter()
        .try_fold(1usize, |n, &d| n.checked_mul(d))
        .ok_or("element count overflows")?;
    if numel == 0 {
        return Ok(0);
    }
    if numel > storage_len && numel > FLAT_LEN {
        return Err(format!(
            "view of {} elements over a storage of {}",
            numel, storage_len
        ));
    }

    let last = dims
        .iter()
        .zip(stride)
        .try_fold(offset, |acc, (&d, &s)| {
            (d - 1).checked_mul(s).and_then(|reach| acc.checked_add(reach))
        })
        .ok_or("view extent overflows")?;
    if last >= storage_len {
        return Err(format!(
            "view reaches element {} of a storage of {}",
            last, storage_len
        ));
    }
    Ok(numel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{
        f32_bytes, f64_bytes, write_archive, write_tensor, write_zip, PickleWriter,
    };
    use tempfile::TempDir;

    fn values(raw: &RawVector) -> Vec<f64> {
        raw.as_array().iter().copied().collect()
    }

    #[test]
    fn test_bare_tensor_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("w.pt");
        let data: Vec<f32> = (0..6).map(|i| i as f32).collect();
        write_tensor(&path, &[2, 3], &data);

        let mut archive = TensorArchive::open(&path).unwrap();
        let raw = archive.read_latent(None).unwrap();
        assert_eq!(raw.shape(), &[2, 3]);
        assert_eq!(values(&raw), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_transposed_view() {
        // transpose of a 2x3 matrix stored row-major
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.pt");
        let mut w = PickleWriter::new();
        w.tensor_view("FloatStorage", "0", 6, 0, &[3, 2], &[1, 3]);
        let storage = f32_bytes(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        write_archive(&path, &w.finish(), &[("0", storage)]);

        let raw = TensorArchive::open(&path).unwrap().read_latent(None).unwrap();
        assert_eq!(raw.shape(), &[3, 2]);
        assert_eq!(values(&raw), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
    }

    #[test]
    fn test_broadcast_stride_zero() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("b.pt");
        let mut w = PickleWriter::new();
        w.tensor_view("DoubleStorage", "0", 2, 0, &[3, 2], &[0, 1]);
        write_archive(&path, &w.finish(), &[("0", f64_bytes(&[0.1, 1.5]))]);

        let raw = TensorArchive::open(&path).unwrap().read_latent(None).unwrap();
        assert_eq!(values(&raw), vec![0.1, 1.5, 0.1, 1.5, 0.1, 1.5]);
    }

    #[test]
    fn test_double_storage_keeps_precision() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("d.pt");
        let mut w = PickleWriter::new();
        w.tensor_view("DoubleStorage", "0", 1, 0, &[1], &[1]);
        let exact = 1.0 + 1e-12;
        write_archive(&path, &w.finish(), &[("0", f64_bytes(&[exact]))]);

        let raw = TensorArchive::open(&path).unwrap().read_latent(None).unwrap();
        assert_eq!(values(&raw), vec![exact]);
    }

    #[test]
    fn test_half_storage_is_widened() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("h.pt");
        let mut w = PickleWriter::new();
        w.tensor_view("HalfStorage", "0", 2, 0, &[2], &[1]);
        // 1.0 and 0.5 as little-endian binary16
        write_archive(&path, &w.finish(), &[("0", vec![0x00, 0x3c, 0x00, 0x38])]);

        let raw = TensorArchive::open(&path).unwrap().read_latent(None).unwrap();
        assert_eq!(values(&raw), vec![1.0, 0.5]);
    }

    #[test]
    fn test_dict_root_uses_first_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("d.pt");
        let mut w = PickleWriter::new();
        w.op(b'}').op(b'(');
        w.str("latent").tensor("0", &[2]);
        w.str("noise").tensor("1", &[2]);
        w.op(b'u');
        write_archive(
            &path,
            &w.finish(),
            &[("0", f32_bytes(&[1.0, 2.0])), ("1", f32_bytes(&[9.0, 9.0]))],
        );

        let first = TensorArchive::open(&path).unwrap().read_latent(None).unwrap();
        assert_eq!(values(&first), vec![1.0, 2.0]);

        let named = TensorArchive::open(&path).unwrap().read_latent(Some("noise")).unwrap();
        assert_eq!(values(&named), vec![9.0, 9.0]);
    }

    #[test]
    fn test_unsupported_storage_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("c.pt");
        let mut w = PickleWriter::new();
        w.tensor_view("ComplexDoubleStorage", "0", 2, 0, &[2], &[1]);
        write_archive(&path, &w.finish(), &[("0", vec![0u8; 32])]);

        let err = TensorArchive::open(&path).unwrap().read_latent(None).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_storage_too_small() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.pt");
        let mut w = PickleWriter::new();
        w.tensor("0", &[4]);
        write_archive(&path, &w.finish(), &[("0", f32_bytes(&[1.0, 2.0]))]);

        let err = TensorArchive::open(&path).unwrap().read_latent(None).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_huge_declared_shape_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge.pt");
        let mut w = PickleWriter::new();
        w.tensor_view("FloatStorage", "0", 2, 0, &[2_000_000_000, 2_000_000_000], &[1, 1]);
        write_archive(&path, &w.finish(), &[("0", f32_bytes(&[1.0, 2.0]))]);

        let result =
            std::panic::catch_unwind(|| TensorArchive::open(&path).unwrap().read_latent(None));
        assert!(matches!(result, Ok(Err(Error::Decode { .. }))));
    }

    #[test]
    fn test_check_view_bounds() {
        assert_eq!(check_view(&[2, 3], &[3, 1], 0, 6), Ok(6));
        assert_eq!(check_view(&[0, 3], &[3, 1], 0, 0), Ok(0));
        assert!(check_view(&[2, 3], &[3, 1], 1, 6).is_err());
        assert!(check_view(&[2], &[1, 1], 0, 6).is_err());
        assert!(check_view(&[usize::MAX, 2], &[1, 1], 0, 6).is_err());
        assert!(check_view(&[2, 2], &[usize::MAX, 1], 0, 6).is_err());
        assert!(check_view(&[FLAT_LEN + 1], &[0], 0, 1).is_err());
        assert_eq!(check_view(&[FLAT_LEN], &[0], 0, 1), Ok(FLAT_LEN));
    }

    #[test]
    fn test_big_endian_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("be.pt");
        let mut w = PickleWriter::new();
        w.tensor("0", &[1]);
        write_zip(
            &path,
            &[
                ("archive/data.pkl".to_string(), w.finish()),
                ("archive/byteorder".to_string(), b"big".to_vec()),
                ("archive/data/0".to_string(), vec![0u8; 4]),
            ],
        );
        assert!(matches!(TensorArchive::open(&path), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_not_a_zip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.pt");
        std::fs::write(&path, b"\x80\x02legacy").unwrap();
        assert!(matches!(TensorArchive::open(&path), Err(Error::Decode { .. })));
    }
}
