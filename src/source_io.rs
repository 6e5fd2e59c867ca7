use memmap2::Mmap;
use std::fs::File;
use std::io;
use std::path::Path;

const MMAP_THRESHOLD: u64 = 1024 * 1024;

pub struct MmapFileReader {
    _file: File,
    mmap: Mmap,
}

impl MmapFileReader {
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        Ok(Self { _file: file, mmap })
    }

    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.mmap)
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.len() == 0
    }
}

/// Reads a source file, memory-mapping it past the size threshold.
pub fn read_source_file(path: &Path) -> io::Result<String> {
    if let Ok(metadata) = std::fs::metadata(path) {
        if metadata.len() > MMAP_THRESHOLD {
            let reader = MmapFileReader::new(path)?;
            return Ok(reader
                .as_str()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
                .to_string());
        }
    }

    std::fs::read_to_string(path)
}
