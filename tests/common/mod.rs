#![allow(dead_code)]

use std::io::{Cursor, Write};

use flate2::Crc;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const README: &[u8] = b"This payload travels at the end of an executable.\n";
pub const LOREM: &[u8] = b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. \
Lorem ipsum dolor sit amet, consectetur adipiscing elit. Sed do eiusmod tempor.\n";

/// A small archive written by the `zip` crate: one directory, one stored
/// entry and one deflated entry.
pub fn sample_zip() -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.add_directory("docs/", SimpleFileOptions::default())
        .unwrap();
    zip.start_file(
        "docs/readme.txt",
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
    )
    .unwrap();
    zip.write_all(README).unwrap();
    zip.start_file(
        "lorem.txt",
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
    )
    .unwrap();
    zip.write_all(LOREM).unwrap();
    zip.finish().unwrap().into_inner()
}

/// Deterministic filler bytes standing in for native code.
pub fn filler(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect()
}

/// An executable-looking prefix of `len` bytes starting with `magic`.
pub fn native_prefix(magic: &[u8], len: usize) -> Vec<u8> {
    let mut prefix = magic.to_vec();
    prefix.extend(filler(len - magic.len(), len as u32));
    prefix
}

pub fn concat(prefix: &[u8], archive: &[u8]) -> Vec<u8> {
    let mut host = prefix.to_vec();
    host.extend_from_slice(archive);
    host
}

pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.sum()
}

fn u16le(b: &mut Vec<u8>, v: u16) {
    b.extend_from_slice(&v.to_le_bytes());
}

fn u32le(b: &mut Vec<u8>, v: u32) {
    b.extend_from_slice(&v.to_le_bytes());
}

fn u64le(b: &mut Vec<u8>, v: u64) {
    b.extend_from_slice(&v.to_le_bytes());
}

/// A single-entry stored archive whose EOCD fields are all saturated, so
/// the directory can only be found through the Zip64 records.
pub fn zip64_archive(name: &str, data: &[u8]) -> Vec<u8> {
    let crc = crc32(data);
    let mut b = Vec::new();

    // local file header
    u32le(&mut b, 0x04034b50);
    u16le(&mut b, 45);
    u16le(&mut b, 0);
    u16le(&mut b, 0);
    u16le(&mut b, 0);
    u16le(&mut b, 0x5821);
    u32le(&mut b, crc);
    u32le(&mut b, data.len() as u32);
    u32le(&mut b, data.len() as u32);
    u16le(&mut b, name.len() as u16);
    u16le(&mut b, 0);
    b.extend_from_slice(name.as_bytes());
    b.extend_from_slice(data);

    // central directory
    let cd_offset = b.len() as u64;
    u32le(&mut b, 0x02014b50);
    u16le(&mut b, 45);
    u16le(&mut b, 45);
    u16le(&mut b, 0);
    u16le(&mut b, 0);
    u16le(&mut b, 0);
    u16le(&mut b, 0x5821);
    u32le(&mut b, crc);
    u32le(&mut b, data.len() as u32);
    u32le(&mut b, data.len() as u32);
    u16le(&mut b, name.len() as u16);
    u16le(&mut b, 0);
    u16le(&mut b, 0);
    u16le(&mut b, 0);
    u16le(&mut b, 0);
    u32le(&mut b, 0);
    u32le(&mut b, 0);
    b.extend_from_slice(name.as_bytes());
    let cd_size = b.len() as u64 - cd_offset;

    // zip64 end of central directory record
    let zip64_offset = b.len() as u64;
    u32le(&mut b, 0x06064b50);
    u64le(&mut b, 44);
    u16le(&mut b, 45);
    u16le(&mut b, 45);
    u32le(&mut b, 0);
    u32le(&mut b, 0);
    u64le(&mut b, 1);
    u64le(&mut b, 1);
    u64le(&mut b, cd_size);
    u64le(&mut b, cd_offset);

    // zip64 locator
    u32le(&mut b, 0x07064b50);
    u32le(&mut b, 0);
    u64le(&mut b, zip64_offset);
    u32le(&mut b, 1);

    // end of central directory with every field saturated
    b.extend_from_slice(&eocd(0xFFFF, 0xFFFF_FFFF, 0xFFFF_FFFF, b""));
    b
}

/// A raw End of Central Directory record.
pub fn eocd(entries: u16, cd_size: u32, cd_offset: u32, comment: &[u8]) -> Vec<u8> {
    let mut b = Vec::new();
    b.extend_from_slice(b"PK\x05\x06");
    u16le(&mut b, 0);
    u16le(&mut b, 0);
    u16le(&mut b, entries);
    u16le(&mut b, entries);
    u32le(&mut b, cd_size);
    u32le(&mut b, cd_offset);
    u16le(&mut b, comment.len() as u16);
    b.extend_from_slice(comment);
    b
}

/// A single-entry archive whose central directory declares the given sizes
/// through a Zip64 extra field, whatever `payload` really holds.
pub fn declared_size_archive(
    name: &str,
    method: u16,
    payload: &[u8],
    compressed: u64,
    uncompressed: u64,
) -> Vec<u8> {
    let mut b = Vec::new();

    // local file header with the real payload length
    u32le(&mut b, 0x04034b50);
    u16le(&mut b, 45);
    u16le(&mut b, 0);
    u16le(&mut b, method);
    u16le(&mut b, 0);
    u16le(&mut b, 0x5821);
    u32le(&mut b, 0);
    u32le(&mut b, payload.len() as u32);
    u32le(&mut b, payload.len() as u32);
    u16le(&mut b, name.len() as u16);
    u16le(&mut b, 0);
    b.extend_from_slice(name.as_bytes());
    b.extend_from_slice(payload);

    let cd_offset = b.len() as u32;
    u32le(&mut b, 0x02014b50);
    u16le(&mut b, 45);
    u16le(&mut b, 45);
    u16le(&mut b, 0);
    u16le(&mut b, method);
    u16le(&mut b, 0);
    u16le(&mut b, 0x5821);
    u32le(&mut b, 0);
    u32le(&mut b, 0xFFFF_FFFF);
    u32le(&mut b, 0xFFFF_FFFF);
    u16le(&mut b, name.len() as u16);
    u16le(&mut b, 20);
    u16le(&mut b, 0);
    u16le(&mut b, 0);
    u16le(&mut b, 0);
    u32le(&mut b, 0);
    u32le(&mut b, 0);
    b.extend_from_slice(name.as_bytes());
    // zip64 extended information: uncompressed, then compressed
    u16le(&mut b, 0x0001);
    u16le(&mut b, 16);
    u64le(&mut b, uncompressed);
    u64le(&mut b, compressed);
    let cd_size = b.len() as u32 - cd_offset;

    b.extend_from_slice(&eocd(1, cd_size, cd_offset, b""));
    b
}
