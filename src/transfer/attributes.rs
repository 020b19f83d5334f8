use crate::geom::{AttributeChannel, AttributeData, Blend, Domain, Mesh, SpatialIndex};

use super::corner::transfer_corner_data;
use super::error::{TransferError, TransferResult};

/// What [`transfer_all_attributes`] did to the target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeTransferOutcome {
    pub removed: Vec<String>,
    pub transferred: Vec<String>,
    /// Channels that could not be transferred; the target simply lacks them.
    pub skipped: Vec<TransferError>,
}

/// Replace every non-internal channel of `target` with the source's channels.
///
/// With `topo_match` channels are copied element for element. Otherwise they are
/// resampled through `index`, the face index of `source` (`None` if it has no
/// faces). Every channel is built completely before it is attached.
pub fn transfer_all_attributes(
    source: &Mesh,
    target: &mut Mesh,
    topo_match: bool,
    index: Option<&SpatialIndex>,
) -> TransferResult<AttributeTransferOutcome> {
    if target.is_empty() {
        return Err(TransferError::EmptyGeometry("target mesh".to_string()));
    }

    let mut outcome = AttributeTransferOutcome::default();
    let mut built = Vec::new();
    let mut resampler = Resampler::new(index);

    for channel in source.attributes.iter().filter(|c| !c.is_internal()) {
        let result = if topo_match {
            copy_channel(channel, target)
        } else {
            resampler.resample(channel, source, target)
        };
        match result {
            Ok(data) => built.push(AttributeChannel::new(channel.name.clone(), channel.domain, data)),
            Err(err) => {
                log::warn!("skipping attribute '{}': {err}", channel.name);
                outcome.skipped.push(err);
            }
        }
    }

    target.attributes.retain(|channel| {
        if channel.is_internal() {
            return true;
        }
        outcome.removed.push(channel.name.clone());
        false
    });
    for channel in built {
        outcome.transferred.push(channel.name.clone());
        target.set_attribute(channel);
    }

    log::debug!(
        "attributes: {} removed, {} transferred, {} skipped",
        outcome.removed.len(),
        outcome.transferred.len(),
        outcome.skipped.len()
    );
    Ok(outcome)
}

fn copy_channel(channel: &AttributeChannel, target: &Mesh) -> TransferResult<AttributeData> {
    let expected = target.domain_len(channel.domain);
    if channel.data.len() != expected {
        return Err(TransferError::LengthMismatch {
            channel: channel.name.clone(),
            expected,
            found: channel.data.len(),
        });
    }
    Ok(channel.data.clone())
}

/// Proximity resampling with the per-point and per-face lookups shared between channels.
struct Resampler<'a> {
    index: Option<&'a SpatialIndex>,
    point_blends: Option<Vec<Blend>>,
    face_sources: Option<Vec<usize>>,
}

impl<'a> Resampler<'a> {
    fn new(index: Option<&'a SpatialIndex>) -> Self {
        Self {
            index,
            point_blends: None,
            face_sources: None,
        }
    }

    fn resample(&mut self, channel: &AttributeChannel, source: &Mesh, target: &Mesh) -> TransferResult<AttributeData> {
        let unsupported = || TransferError::UnsupportedProximityDomain {
            channel: channel.name.clone(),
            domain: channel.domain,
            kind: channel.data.kind(),
        };
        if channel.domain == Domain::Edge || !channel.data.kind().is_interpolable() {
            return Err(unsupported());
        }
        let expected = source.domain_len(channel.domain);
        if channel.data.len() != expected {
            return Err(TransferError::LengthMismatch {
                channel: channel.name.clone(),
                expected,
                found: channel.data.len(),
            });
        }
        let index = self
            .index
            .ok_or_else(|| TransferError::InvalidGeometry("source mesh has no faces".to_string()))?;

        let data = match channel.domain {
            Domain::Point => {
                let blends = self.point_blends(index, target)?;
                channel.data.blend(blends)
            }
            Domain::Face => {
                let faces = self.face_sources(index, target)?;
                channel.data.gather(faces)
            }
            Domain::Corner => return transfer_corner_data(source, target, channel, index),
            Domain::Edge => return Err(unsupported()),
        };
        data.ok_or_else(|| TransferError::InvalidGeometry(format!("attribute '{}' could not be resampled", channel.name)))
    }

    fn point_blends(&mut self, index: &SpatialIndex, target: &Mesh) -> TransferResult<&[Blend]> {
        if self.point_blends.is_none() {
            let blends = target
                .positions
                .iter()
                .map(|&p| index.sample(p.into()).map(|s| s.point_blend()))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| TransferError::InvalidGeometry("source mesh has no faces".to_string()))?;
            self.point_blends = Some(blends);
        }
        Ok(self.point_blends.as_deref().unwrap_or_default())
    }

    fn face_sources(&mut self, index: &SpatialIndex, target: &Mesh) -> TransferResult<&[usize]> {
        if self.face_sources.is_none() {
            let faces = (0..target.face_count())
                .map(|f| target.face_center(f).and_then(|c| index.nearest_face(c)))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| TransferError::InvalidGeometry("target face without a source counterpart".to_string()))?;
            self.face_sources = Some(faces);
        }
        Ok(self.face_sources.as_deref().unwrap_or_default())
    }
}
