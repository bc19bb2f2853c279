//! Zone geometry file format: a small header followed by length-prefixed
//! WKB polygons, optionally gzip-compressed.

use std::io::{Cursor, Read, Write};

use anyhow::{Context, Result, bail, ensure};
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use geo::{Coord, LineString, Polygon};

/// WKB geometry type for Polygon
const WKB_POLYGON: u32 = 3;
/// WKB byte order: little endian
const WKB_LE: u8 = 1;

/// Magic bytes for the zone geometry file: "MLZG" (Muland Zone Geometry)
const MAGIC: &[u8] = b"MLZG";
/// Format version (currently 1)
const VERSION: u8 = 1;

fn write_ring(out: &mut Vec<u8>, ring: &LineString<f64>) -> Result<()> {
    out.write_all(&(ring.0.len() as u32).to_le_bytes())?;
    for coord in ring.coords() {
        out.write_all(&coord.x.to_le_bytes())?;
        out.write_all(&coord.y.to_le_bytes())?;
    }
    Ok(())
}

/// Write a Polygon to little-endian WKB.
fn polygon_to_wkb(polygon: &Polygon<f64>) -> Result<Vec<u8>> {
    let mut wkb = Vec::new();
    wkb.write_all(&[WKB_LE])?;
    wkb.write_all(&WKB_POLYGON.to_le_bytes())?;
    wkb.write_all(&(1 + polygon.interiors().len() as u32).to_le_bytes())?;
    write_ring(&mut wkb, polygon.exterior())?;
    for interior in polygon.interiors() {
        write_ring(&mut wkb, interior)?;
    }
    Ok(wkb)
}

/// Byte-order aware reader over a WKB buffer.
struct WkbReader<'a> {
    cursor: Cursor<&'a [u8]>,
    little_endian: bool,
}

impl WkbReader<'_> {
    fn u32(&mut self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        self.cursor.read_exact(&mut bytes)?;
        Ok(if self.little_endian { u32::from_le_bytes(bytes) } else { u32::from_be_bytes(bytes) })
    }

    fn f64(&mut self) -> Result<f64> {
        let mut bytes = [0u8; 8];
        self.cursor.read_exact(&mut bytes)?;
        Ok(if self.little_endian { f64::from_le_bytes(bytes) } else { f64::from_be_bytes(bytes) })
    }

    fn ring(&mut self) -> Result<LineString<f64>> {
        let len = self.u32().context("Failed to read ring length")? as usize;
        let coords = (0..len)
            .map(|_| Ok(Coord { x: self.f64()?, y: self.f64()? }))
            .collect::<Result<Vec<_>>>()
            .context("Failed to read ring coordinates")?;
        Ok(LineString::from(coords))
    }
}

/// Read a Polygon from WKB (either byte order).
fn polygon_from_wkb(bytes: &[u8]) -> Result<Polygon<f64>> {
    let mut cursor = Cursor::new(bytes);
    let mut order = [0u8; 1];
    cursor.read_exact(&mut order).context("Failed to read byte order")?;

    let mut reader = WkbReader { cursor, little_endian: order[0] == WKB_LE };
    let geom_type = reader.u32().context("Failed to read geometry type")?;
    ensure!(geom_type == WKB_POLYGON, "Expected Polygon geometry type, got {geom_type}");

    let num_rings = reader.u32().context("Failed to read number of rings")?;
    ensure!(num_rings > 0, "Polygon must have at least one ring");

    let exterior = reader.ring()?;
    let interiors = (1..num_rings).map(|_| reader.ring()).collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

/// Encode polygons into a zone geometry file.
pub(crate) fn write_polygons(polygons: &[Polygon<f64>], compress: bool) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.write_all(MAGIC)?;
    out.write_all(&[VERSION])?;
    out.write_all(&(polygons.len() as u32).to_le_bytes())?;
    out.write_all(&[compress as u8])?;

    let mut body = Vec::new();
    for polygon in polygons {
        let wkb = polygon_to_wkb(polygon)?;
        body.write_all(&(wkb.len() as u32).to_le_bytes())?;
        body.write_all(&wkb)?;
    }

    if compress {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&body).context("Failed to compress WKB data")?;
        out.write_all(&encoder.finish().context("Failed to finish compression")?)?;
    } else {
        out.write_all(&body)?;
    }
    Ok(out)
}

/// Decode a zone geometry file.
pub(crate) fn read_polygons(bytes: &[u8]) -> Result<Vec<Polygon<f64>>> {
    let mut cursor = Cursor::new(bytes);

    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic).context("Failed to read magic bytes")?;
    if magic != MAGIC {
        bail!("Invalid zone geometry file: bad magic bytes");
    }

    let mut header = [0u8; 6];
    cursor.read_exact(&mut header).context("Failed to read header")?;
    if header[0] != VERSION {
        bail!("Unsupported zone geometry file version: {}", header[0]);
    }
    let count = u32::from_le_bytes([header[1], header[2], header[3], header[4]]) as usize;

    let mut data = Vec::new();
    cursor.read_to_end(&mut data)?;
    if header[5] != 0 {
        let mut decompressed = Vec::new();
        GzDecoder::new(&data[..]).read_to_end(&mut decompressed)
            .context("Failed to decompress WKB data")?;
        data = decompressed;
    }

    let mut body = Cursor::new(&data[..]);
    (0..count)
        .map(|i| {
            let mut len = [0u8; 4];
            body.read_exact(&mut len).with_context(|| format!("Failed to read length of polygon {i}"))?;
            let mut wkb = vec![0u8; u32::from_le_bytes(len) as usize];
            body.read_exact(&mut wkb).with_context(|| format!("Failed to read polygon {i}"))?;
            polygon_from_wkb(&wkb).with_context(|| format!("Failed to parse polygon {i}"))
        })
        .collect()
}
