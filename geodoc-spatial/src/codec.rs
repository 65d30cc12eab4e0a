//! Compact binary codecs for cached geometries and index shapes.
//!
//! All integers are big-endian and fixed width; strings are UTF-8 with an
//! i32 byte-length prefix. Cached geometries keep full double precision,
//! while index shapes are written as 32-bit floats.
//!
//! Each geometry is prefixed with a one-byte variant tag. Encoding is
//! total over [`CacheGeometry`]; decoding branches on the tag and treats
//! an unrecognized value as a fatal [`SpatialError::UnsupportedVariant`].

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::{CacheGeometry, Coord, IndexShape, PolygonRings};

const TAG_POINT: u8 = 1;
const TAG_LINE_STRING: u8 = 2;
const TAG_POLYGON: u8 = 3;
const TAG_MULTI_POINT: u8 = 4;
const TAG_MULTI_LINE_STRING: u8 = 5;
const TAG_MULTI_POLYGON: u8 = 6;

const SHAPE_TAG_POINT: u8 = 1;
const SHAPE_TAG_RECT: u8 = 2;

/// Encodes a cached geometry.
pub fn encode_geometry<W: Write>(writer: &mut W, geometry: &CacheGeometry) -> SpatialResult<()> {
    match geometry {
        CacheGeometry::Point(coord) => {
            writer.write_u8(TAG_POINT)?;
            write_coord(writer, coord)?;
        }
        CacheGeometry::LineString(coords) => {
            writer.write_u8(TAG_LINE_STRING)?;
            write_coords(writer, coords)?;
        }
        CacheGeometry::Polygon(rings) => {
            writer.write_u8(TAG_POLYGON)?;
            write_polygon(writer, rings)?;
        }
        CacheGeometry::MultiPoint(parts) => {
            writer.write_u8(TAG_MULTI_POINT)?;
            write_parts(writer, parts)?;
        }
        CacheGeometry::MultiLineString(parts) => {
            writer.write_u8(TAG_MULTI_LINE_STRING)?;
            write_parts(writer, parts)?;
        }
        CacheGeometry::MultiPolygon(polygons) => {
            writer.write_u8(TAG_MULTI_POLYGON)?;
            write_count(writer, polygons.len())?;
            for rings in polygons {
                write_polygon(writer, rings)?;
            }
        }
    }
    Ok(())
}

/// Decodes a cached geometry.
pub fn decode_geometry<R: Read>(reader: &mut R) -> SpatialResult<CacheGeometry> {
    let tag = reader.read_u8()?;
    match tag {
        TAG_POINT => Ok(CacheGeometry::Point(read_coord(reader)?)),
        TAG_LINE_STRING => Ok(CacheGeometry::LineString(read_coords(reader)?)),
        TAG_POLYGON => Ok(CacheGeometry::Polygon(read_polygon(reader)?)),
        TAG_MULTI_POINT => Ok(CacheGeometry::MultiPoint(read_parts(reader)?)),
        TAG_MULTI_LINE_STRING => Ok(CacheGeometry::MultiLineString(read_parts(reader)?)),
        TAG_MULTI_POLYGON => {
            let count = read_count(reader)?;
            let mut polygons = Vec::with_capacity(count);
            for _ in 0..count {
                polygons.push(read_polygon(reader)?);
            }
            Ok(CacheGeometry::MultiPolygon(polygons))
        }
        other => Err(SpatialError::UnsupportedVariant(format!(
            "Unknown geometry tag {} in snapshot stream",
            other
        ))),
    }
}

/// Encodes an index bounding shape.
pub fn encode_shape<W: Write>(writer: &mut W, shape: &IndexShape) -> SpatialResult<()> {
    match *shape {
        IndexShape::Point { x, y } => {
            writer.write_u8(SHAPE_TAG_POINT)?;
            writer.write_f32::<BigEndian>(x)?;
            writer.write_f32::<BigEndian>(y)?;
        }
        IndexShape::Rect { x1, y1, x2, y2 } => {
            writer.write_u8(SHAPE_TAG_RECT)?;
            writer.write_f32::<BigEndian>(x1)?;
            writer.write_f32::<BigEndian>(y1)?;
            writer.write_f32::<BigEndian>(x2)?;
            writer.write_f32::<BigEndian>(y2)?;
        }
    }
    Ok(())
}

/// Decodes an index bounding shape.
pub fn decode_shape<R: Read>(reader: &mut R) -> SpatialResult<IndexShape> {
    let tag = reader.read_u8()?;
    match tag {
        SHAPE_TAG_POINT => {
            let x = reader.read_f32::<BigEndian>()?;
            let y = reader.read_f32::<BigEndian>()?;
            Ok(IndexShape::Point { x, y })
        }
        SHAPE_TAG_RECT => {
            let x1 = reader.read_f32::<BigEndian>()?;
            let y1 = reader.read_f32::<BigEndian>()?;
            let x2 = reader.read_f32::<BigEndian>()?;
            let y2 = reader.read_f32::<BigEndian>()?;
            Ok(IndexShape::Rect { x1, y1, x2, y2 })
        }
        other => Err(SpatialError::UnsupportedVariant(format!(
            "Unknown index shape tag {} in snapshot stream",
            other
        ))),
    }
}

/// Writes an i32 element count.
pub(crate) fn write_count<W: Write>(writer: &mut W, count: usize) -> SpatialResult<()> {
    let count = i32::try_from(count).map_err(|_| {
        SpatialError::corrupt(format!("Element count {} exceeds the i32 wire limit", count))
    })?;
    writer.write_i32::<BigEndian>(count)?;
    Ok(())
}

/// Reads an i32 element count, rejecting negative values.
pub(crate) fn read_count<R: Read>(reader: &mut R) -> SpatialResult<usize> {
    let count = reader.read_i32::<BigEndian>()?;
    usize::try_from(count)
        .map_err(|_| SpatialError::corrupt(format!("Negative element count {}", count)))
}

/// Writes a length-prefixed UTF-8 string.
pub(crate) fn write_utf<W: Write>(writer: &mut W, value: &str) -> SpatialResult<()> {
    write_count(writer, value.len())?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

/// Reads a length-prefixed UTF-8 string.
pub(crate) fn read_utf<R: Read>(reader: &mut R) -> SpatialResult<String> {
    let len = read_count(reader)?;
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes)
        .map_err(|e| SpatialError::corrupt(format!("Invalid UTF-8 in snapshot string: {}", e)))
}

fn write_coord<W: Write>(writer: &mut W, coord: &Coord) -> SpatialResult<()> {
    writer.write_f64::<BigEndian>(coord.x)?;
    writer.write_f64::<BigEndian>(coord.y)?;
    writer.write_f64::<BigEndian>(coord.z)?;
    Ok(())
}

fn read_coord<R: Read>(reader: &mut R) -> SpatialResult<Coord> {
    let x = reader.read_f64::<BigEndian>()?;
    let y = reader.read_f64::<BigEndian>()?;
    let z = reader.read_f64::<BigEndian>()?;
    Ok(Coord::new(x, y, z))
}

fn write_coords<W: Write>(writer: &mut W, coords: &[Coord]) -> SpatialResult<()> {
    write_count(writer, coords.len())?;
    for coord in coords {
        write_coord(writer, coord)?;
    }
    Ok(())
}

fn read_coords<R: Read>(reader: &mut R) -> SpatialResult<Vec<Coord>> {
    let count = read_count(reader)?;
    let mut coords = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        coords.push(read_coord(reader)?);
    }
    Ok(coords)
}

fn write_polygon<W: Write>(writer: &mut W, rings: &PolygonRings) -> SpatialResult<()> {
    write_coords(writer, &rings.shell)?;
    write_count(writer, rings.holes.len())?;
    for hole in &rings.holes {
        write_coords(writer, hole)?;
    }
    Ok(())
}

fn read_polygon<R: Read>(reader: &mut R) -> SpatialResult<PolygonRings> {
    let shell = read_coords(reader)?;
    let hole_count = read_count(reader)?;
    let mut holes = Vec::with_capacity(hole_count.min(4096));
    for _ in 0..hole_count {
        holes.push(read_coords(reader)?);
    }
    Ok(PolygonRings::new(shell, holes))
}

fn write_parts<W: Write>(writer: &mut W, parts: &[CacheGeometry]) -> SpatialResult<()> {
    write_count(writer, parts.len())?;
    for part in parts {
        encode_geometry(writer, part)?;
    }
    Ok(())
}

fn read_parts<R: Read>(reader: &mut R) -> SpatialResult<Vec<CacheGeometry>> {
    let count = read_count(reader)?;
    let mut parts = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        parts.push(decode_geometry(reader)?);
    }
    Ok(parts)
}
