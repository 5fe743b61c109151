use crate::foundation::core::Resolution;
use crate::foundation::error::{TileviewError, TileviewResult};
use crate::frame::video::Plane;
use crate::render::backend::{PlaneView, Raster};

/// Contiguous per-plane copies of the input frame, reused from frame to frame.
#[derive(Debug, Default)]
pub(crate) struct PlaneStaging {
    buffers: Vec<StagedPlane>,
}

#[derive(Debug, Default)]
struct StagedPlane {
    resolution: Option<Resolution>,
    data: Vec<u8>,
}

impl PlaneStaging {
    /// Copy the top-left `res` region of `src` into staging slot `index`, dropping row padding.
    pub(crate) fn stage(
        &mut self,
        index: usize,
        src: &Plane,
        res: Resolution,
    ) -> TileviewResult<PlaneView<'_>> {
        if src.width < res.width || src.height < res.height {
            return Err(TileviewError::frame(format!(
                "plane {index} is {}x{}, smaller than the configured {}x{}",
                src.width, src.height, res.width, res.height
            )));
        }
        if self.buffers.len() <= index {
            self.buffers.resize_with(index + 1, StagedPlane::default);
        }
        let slot = &mut self.buffers[index];
        if slot.resolution != Some(res) {
            slot.data = vec![0; res.area()];
            slot.resolution = Some(res);
        }

        let row = res.width as usize;
        for (y, dst) in slot.data.chunks_exact_mut(row.max(1)).enumerate() {
            let start = y * src.linesize;
            dst.copy_from_slice(&src.data[start..start + row]);
        }
        PlaneView::new(&slot.data, res.width, res.height)
    }

    /// Drop every staging buffer.
    pub(crate) fn release(&mut self) {
        self.buffers.clear();
    }

    /// Bytes currently held.
    pub(crate) fn retained_bytes(&self) -> usize {
        self.buffers.iter().map(|b| b.data.len()).sum()
    }
}

/// Copy a rendered raster into an output plane row by row, honoring the plane stride.
pub(crate) fn write_back(raster: &Raster, dst: &mut Plane) -> TileviewResult<()> {
    if raster.resolution() != dst.resolution() {
        return Err(TileviewError::frame(format!(
            "raster is {}x{} but the output plane is {}x{}",
            raster.width, raster.height, dst.width, dst.height
        )));
    }
    let row = raster.width as usize;
    for (y, src) in raster.data.chunks_exact(row.max(1)).enumerate() {
        dst.row_mut(y as u32).copy_from_slice(src);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/staging.rs"]
mod tests;
