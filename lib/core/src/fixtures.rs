//! Builders for small `torch.save`-shaped archives used by the unit tests

use candle_core::pickle::{Object, Stack};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Emits the pickle opcodes `torch.save` produces for tensors and dicts
pub(crate) struct PickleWriter {
    buf: Vec<u8>,
}

impl PickleWriter {
    pub(crate) fn new() -> Self {
        Self { buf: vec![0x80, 0x02] }
    }

    pub(crate) fn op(&mut self, op: u8) -> &mut Self {
        self.buf.push(op);
        self
    }

    pub(crate) fn str(&mut self, s: &str) -> &mut Self {
        self.buf.push(b'X');
        self.buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    fn int(&mut self, v: i32) -> &mut Self {
        self.buf.push(b'J');
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn global(&mut self, module: &str, name: &str) -> &mut Self {
        self.buf.push(b'c');
        self.buf.extend_from_slice(module.as_bytes());
        self.buf.push(b'\n');
        self.buf.extend_from_slice(name.as_bytes());
        self.buf.push(b'\n');
        self
    }

    /// Contiguous float tensor over the whole storage `key`
    pub(crate) fn tensor(&mut self, key: &str, shape: &[usize]) -> &mut Self {
        let mut stride = vec![1usize; shape.len()];
        for axis in (0..shape.len().saturating_sub(1)).rev() {
            stride[axis] = stride[axis + 1] * shape[axis + 1];
        }
        let numel = shape.iter().product();
        self.tensor_view("FloatStorage", key, numel, 0, shape, &stride)
    }

    pub(crate) fn tensor_view(
        &mut self,
        class: &str,
        key: &str,
        numel: usize,
        offset: usize,
        shape: &[usize],
        stride: &[usize],
    ) -> &mut Self {
        self.global("torch._utils", "_rebuild_tensor_v2").op(b'(');
        self.op(b'(').str("storage").global("torch", class).str(key).str("cpu");
        self.int(numel as i32).op(b't').op(b'Q');
        self.int(offset as i32);
        self.op(b'(');
        for &d in shape {
            self.int(d as i32);
        }
        self.op(b't').op(b'(');
        for &s in stride {
            self.int(s as i32);
        }
        self.op(b't').op(0x89);
        self.global("collections", "OrderedDict").op(b')').op(b'R');
        self.op(b't').op(b'R')
    }

    pub(crate) fn finish(&mut self) -> Vec<u8> {
        let mut out = std::mem::take(&mut self.buf);
        out.push(b'.');
        out
    }
}

pub(crate) fn parse(program: &[u8]) -> Object {
    let mut stack = Stack::empty();
    stack.read_loop(&mut &program[..]).unwrap();
    stack.finalize().unwrap()
}

/// Write `entries` into a stored (uncompressed) zip file
pub(crate) fn write_zip(path: &Path, entries: &[(String, Vec<u8>)]) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = || SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, bytes) in entries {
        zip.start_file(name.as_str(), options()).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
}

/// Write a zip archive laid out like `torch.save` output
pub(crate) fn write_archive(path: &Path, pickle: &[u8], storages: &[(&str, Vec<u8>)]) {
    let mut entries = vec![
        ("archive/data.pkl".to_string(), pickle.to_vec()),
        ("archive/byteorder".to_string(), b"little".to_vec()),
    ];
    for (key, bytes) in storages {
        entries.push((format!("archive/data/{key}"), bytes.clone()));
    }
    write_zip(path, &entries);
}

pub(crate) fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub(crate) fn f64_bytes(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Archive holding a single contiguous float tensor as its root object
pub(crate) fn write_tensor(path: &Path, shape: &[usize], values: &[f32]) {
    let mut w = PickleWriter::new();
    w.tensor("0", shape);
    write_archive(path, &w.finish(), &[("0", f32_bytes(values))]);
}
