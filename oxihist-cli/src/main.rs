//! oxihist - long-range compressor for snapshot-heavy streams.
//!
//! Packs streams with long (100+ byte) repetitions in a 4 MiB window.
//! Reads standard input, writes standard output; the direction is chosen by
//! peeking at the input's leading bytes. While compressing, every output
//! byte is also fed to a mirror decompressor on a second thread, and the
//! process only succeeds once the mirror has verified the whole stream.

mod pipe;

use oxihist_codec::frame;
use oxihist_codec::{Compressor, Decompressor, StopAfter, COMP_HIST_BITS};
use oxihist_core::error::{OxihistError, Result};
use pipe::{PipeReader, TeeWriter};
use std::io::{self, BufRead, BufWriter, Read, Write};
use std::process;
use std::thread;

const USAGE: &str = "\
usage: oxihist < input > output

oxihist takes no arguments. It compresses standard input to standard
output, or decompresses it when the input carries the oxihist signature.
Input that already looks like bzip2/gzip/xz/zip/7z data is refused.";

/// Chunks the self-check pipe may buffer before the writer blocks.
const PIPE_DEPTH: usize = 16;

fn main() {
    if std::env::args_os().len() > 1 {
        eprintln!("{USAGE}");
        process::exit(255);
    }
    if let Err(e) = run() {
        eprintln!("oxihist: {e}");
        process::exit(255);
    }
}

fn run() -> Result<()> {
    let mut input = io::stdin().lock();

    let mut head = [0u8; frame::HEADER_LEN];
    let head_len = fill(&mut input, &mut head)?;
    let head = &head[..head_len];

    if head.starts_with(&frame::MAGIC) {
        decompress_stream(head, input)
    } else if let Some(format) = frame::foreign_signature(head) {
        eprintln!("input already looks like {format} data; refusing to pack it\n");
        eprintln!("{USAGE}");
        process::exit(255)
    } else {
        compress_stream(head, input)
    }
}

/// Read up to `buf.len()` bytes, stopping early only at EOF.
fn fill<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut len = 0;
    while len < buf.len() {
        let n = r.read(&mut buf[len..])?;
        if n == 0 {
            break;
        }
        len += n;
    }
    Ok(len)
}

fn compress_stream<R: BufRead>(head: &[u8], mut input: R) -> Result<()> {
    let stdout = io::stdout().lock();
    let mut stdout = BufWriter::new(stdout);

    // The frame header goes only to the consumer; the mirror sees the bare
    // instruction stream.
    frame::write_header(&mut stdout)?;

    let (pipe_tx, pipe_rx) = pipe::pipe(PIPE_DEPTH);
    let mirror = thread::spawn(move || mirror_check(pipe_rx));

    let mut compressor = Compressor::new(TeeWriter::new(stdout, pipe_tx));
    compressor.write_all(head)?;
    io::copy(&mut input, &mut compressor)?;
    let tee = compressor.finish()?;

    let (mut stdout, pipe_tx) = tee.into_parts();
    stdout.flush()?;
    drop(pipe_tx); // end of stream for the mirror

    match mirror.join() {
        Ok(result) => result.map_err(OxihistError::self_check),
        Err(_) => Err(OxihistError::self_check(OxihistError::Io(io::Error::other(
            "self-check thread panicked",
        )))),
    }
}

/// Decode the compressor's own output, discarding the bytes but verifying
/// every block checksum.
fn mirror_check(pipe_rx: PipeReader) -> Result<()> {
    let mut mirror = Decompressor::new(pipe_rx, COMP_HIST_BITS, StopAfter::OneBlock);
    let verified: Result<()> = (|| {
        while mirror.copy_block(&mut io::sink())?.is_some() {}
        Ok(())
    })();
    if verified.is_err() {
        // Keep draining so the compressor never blocks on a full pipe.
        let _ = io::copy(&mut mirror.into_inner(), &mut io::sink());
    }
    verified
}

fn decompress_stream<R: BufRead>(head: &[u8], input: R) -> Result<()> {
    let mut reader = head.chain(input);
    let header = frame::read_header(&mut reader)?;

    let stdout = io::stdout().lock();
    let mut stdout = BufWriter::new(stdout);

    let mut decompressor = Decompressor::new(
        io::BufReader::new(reader),
        header.hist_bits,
        StopAfter::OneBlock,
    );
    while decompressor.copy_block(&mut stdout)?.is_some() {}
    stdout.flush()?;
    Ok(())
}
