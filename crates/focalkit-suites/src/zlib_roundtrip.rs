//! `compress2` / `uncompress` round trip over a real deflate implementation.

use std::io::{self, Write};

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use focalkit_harness::{ScratchFile, Suite, TestContext, expect_eq, expect_false, expect_ok, expect_true};

pub const SUITE: &str = "zlib_roundtrip";

const PHRASE: &str = "The quick brown fox jumps over the lazy dog. ";
const REPEATS: usize = 102;

/// Status codes of the one-shot helpers, after zlib's `Z_*` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZStatus {
    Ok,
    BufError,
    DataError,
}

impl ZStatus {
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::BufError => -5,
            Self::DataError => -3,
        }
    }
}

/// The sample text: the pangram repeated until it is 4590 bytes long.
#[must_use]
pub fn sample_text() -> Vec<u8> {
    PHRASE.repeat(REPEATS).into_bytes()
}

/// Upper bound on `compress2` output for `len` input bytes.
#[must_use]
pub const fn compress_bound(len: usize) -> usize {
    len + (len >> 12) + (len >> 14) + (len >> 25) + 13
}

/// One-shot zlib stream at `level`.
pub fn compress2(src: &[u8], level: Compression) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(compress_bound(src.len())), level);
    encoder.write_all(src)?;
    encoder.finish()
}

/// Inflate `src` into at most `capacity` bytes.
///
/// A destination that fills before the stream ends is a `BufError`, and the
/// returned bytes are the first `capacity` bytes of the stream. Input that
/// runs out while the destination still has room is a `DataError`, as is a
/// corrupt stream.
#[must_use]
pub fn uncompress(src: &[u8], capacity: usize) -> (ZStatus, Vec<u8>) {
    let mut out = vec![0_u8; capacity];
    let mut inflater = Decompress::new(true);
    let result = inflater.decompress(src, &mut out, FlushDecompress::Finish);
    let written = usize::try_from(inflater.total_out()).map_or(capacity, |n| n.min(capacity));
    out.truncate(written);
    let status = match result {
        Ok(Status::StreamEnd) => ZStatus::Ok,
        Ok(_) if written == capacity => ZStatus::BufError,
        Ok(_) | Err(_) => ZStatus::DataError,
    };
    (status, out)
}

// ---------------------------------------------------------------------------
// Cases
// ---------------------------------------------------------------------------

fn round_trip(ctx: &mut TestContext<'_>) {
    let text = sample_text();
    expect_eq!(ctx, text.len(), 4590);
    let Some(compressed) = expect_ok!(ctx, compress2(&text, Compression::best())) else {
        return;
    };
    expect_true!(ctx, compressed.len() < text.len(), "repetitive text shrinks");
    expect_true!(ctx, compressed.len() <= compress_bound(text.len()));
    let (status, restored) = uncompress(&compressed, text.len());
    expect_eq!(ctx, status, ZStatus::Ok);
    expect_eq!(ctx, restored.len(), text.len());
    expect_true!(ctx, restored == text, "restored bytes match");
    ctx.note(format!("{} -> {} bytes", text.len(), compressed.len()));
}

fn scratch_file_round_trip(ctx: &mut TestContext<'_>) {
    let text = sample_text();
    let Some(compressed) = expect_ok!(ctx, compress2(&text, Compression::best())) else {
        return;
    };
    let Some(mut file) = expect_ok!(ctx, ScratchFile::with_contents("zlib-", &compressed)) else {
        return;
    };
    let path = file.path().to_path_buf();
    if let Some(stored) = expect_ok!(ctx, file.read_back()) {
        let (status, restored) = uncompress(&stored, text.len());
        expect_eq!(ctx, status, ZStatus::Ok);
        expect_true!(ctx, restored == text);
    }
    drop(file);
    expect_false!(ctx, path.exists(), "scratch file removed on drop");
}

fn small_destination(ctx: &mut TestContext<'_>) {
    let text = sample_text();
    let Some(compressed) = expect_ok!(ctx, compress2(&text, Compression::best())) else {
        return;
    };
    let (status, partial) = uncompress(&compressed, 100);
    expect_eq!(ctx, status, ZStatus::BufError);
    expect_eq!(ctx, status.code(), -5);
    expect_eq!(ctx, partial.as_slice(), &text[..100]);
}

fn corrupt_input(ctx: &mut TestContext<'_>) {
    let (status, _) = uncompress(b"not a zlib stream at all", 64);
    expect_eq!(ctx, status, ZStatus::DataError);
    expect_eq!(ctx, status.code(), -3);
}

fn truncated_input(ctx: &mut TestContext<'_>) {
    let text = sample_text();
    let Some(compressed) = expect_ok!(ctx, compress2(&text, Compression::best())) else {
        return;
    };
    let cut = &compressed[..compressed.len() / 2];
    let (status, partial) = uncompress(cut, text.len());
    expect_eq!(ctx, status, ZStatus::DataError, "incomplete stream with room left");
    expect_true!(ctx, partial.len() < text.len());
    expect_true!(ctx, text.starts_with(&partial), "partial output is a prefix");
}

#[must_use]
pub fn suite() -> Suite {
    Suite::new(SUITE, "compress2 / uncompress")
        .case("round_trip", "4590-byte text survives best compression", round_trip)
        .case(
            "scratch_file_round_trip",
            "compressed bytes survive a trip through a scratch file",
            scratch_file_round_trip,
        )
        .case(
            "small_destination",
            "a 100-byte destination is a buffer error",
            small_destination,
        )
        .case("corrupt_input", "garbage input is a data error", corrupt_input)
        .case(
            "truncated_input",
            "half a stream with a roomy destination is a data error",
            truncated_input,
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bound_covers_incompressible_input() {
        let noise: Vec<u8> = (0..2048_u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8).collect();
        let packed = compress2(&noise, Compression::none()).unwrap();
        assert!(packed.len() <= compress_bound(noise.len()));
        assert_eq!(uncompress(&packed, noise.len()), (ZStatus::Ok, noise));
    }

    #[test]
    fn truncation_and_overflow_are_told_apart() {
        let text = sample_text();
        let packed = compress2(&text, Compression::best()).unwrap();
        let (status, _) = uncompress(&packed[..packed.len() - 8], text.len() + 1);
        assert_eq!(status, ZStatus::DataError);
        let (status, out) = uncompress(&packed, text.len() - 1);
        assert_eq!(status, ZStatus::BufError);
        assert_eq!(out.len(), text.len() - 1);
    }
}
