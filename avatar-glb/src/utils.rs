//! Chunk alignment, accessor bounds, and the final GLB container layout.

use crate::error::ContainerError;
use gltf_json as json;

/// Per-axis min/max over a position or displacement stream.
///
/// Accessor bounds are mandatory for POSITION and morph displacement
/// accessors, so an empty stream still yields the `f32::MAX`/`f32::MIN`
/// sentinels rather than a panic.
pub fn compute_bounds(data: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];

    for item in data {
        for axis in 0..3 {
            min[axis] = min[axis].min(item[axis]);
            max[axis] = max[axis].max(item[axis]);
        }
    }

    (min, max)
}

/// Pad with zero bytes to the next 4-byte boundary.
pub fn align_buffer(buffer: &mut Vec<u8>) {
    while buffer.len() % 4 != 0 {
        buffer.push(0);
    }
}

/// Lay out the GLB container: 12-byte header, JSON chunk, BIN chunk.
///
/// The JSON chunk is padded with spaces so the padded text still parses;
/// the BIN chunk is padded with zeros. Chunk lengths in the header count
/// the padding, as required for byte-exact output.
pub fn assemble_glb(root: &json::Root, buffer_data: &[u8]) -> Result<Vec<u8>, ContainerError> {
    let json_string = json::serialize::to_string(root)?;
    let json_bytes = json_string.as_bytes();

    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let json_chunk_length = json_bytes.len() + json_padding;

    let bin_padding = (4 - (buffer_data.len() % 4)) % 4;
    let bin_chunk_length = buffer_data.len() + bin_padding;

    let total_length = 12 + 8 + json_chunk_length + 8 + bin_chunk_length;

    let mut glb = Vec::with_capacity(total_length);

    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total_length as u32).to_le_bytes());

    glb.extend_from_slice(&(json_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x4E4F534Au32.to_le_bytes()); // "JSON"
    glb.extend_from_slice(json_bytes);
    for _ in 0..json_padding {
        glb.push(b' ');
    }

    glb.extend_from_slice(&(bin_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&0x004E4942u32.to_le_bytes()); // "BIN\0"
    glb.extend_from_slice(buffer_data);
    for _ in 0..bin_padding {
        glb.push(0);
    }

    Ok(glb)
}
