use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheKey, FieldCache};
use crate::config::{Channel, ChannelConfig, Dimensionality, GenerationRequest};
use crate::error::Result;
use crate::field::ScalarField;
use crate::generate::generate;

/// The four resolved channel fields of one request, in RGBA order.
#[derive(Clone, Debug)]
pub struct ChannelFields {
    dimensionality: Dimensionality,
    resolution: u32,
    fields: [Arc<ScalarField>; 4],
}

impl ChannelFields {
    pub fn new(
        dimensionality: Dimensionality,
        resolution: u32,
        fields: [Arc<ScalarField>; 4],
    ) -> Self {
        debug_assert!(fields.iter().all(|f| f.resolution() == resolution));
        Self {
            dimensionality,
            resolution,
            fields,
        }
    }

    pub fn get(&self, channel: Channel) -> &ScalarField {
        &self.fields[channel.index()]
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }
}

/// Resolves channel configs into fields, serving repeats from a shared cache.
#[derive(Default)]
pub struct ChannelPipeline {
    cache: FieldCache,
}

impl ChannelPipeline {
    pub fn new(cache: FieldCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &FieldCache {
        &self.cache
    }

    /// One channel's field. A cache hit is the same field a fresh `generate`
    /// call would produce for these inputs.
    pub fn resolve_channel(
        &self,
        config: &ChannelConfig,
        request: &GenerationRequest,
    ) -> Result<Arc<ScalarField>> {
        if let ChannelConfig::None = config {
            return Ok(Arc::new(ScalarField::zeros(
                request.dimensionality,
                request.resolution,
            )));
        }

        let key = CacheKey::new(
            config,
            request.dimensionality,
            request.resolution,
            request.seed,
        );
        if let Some(hit) = self.cache.get(&key) {
            debug!(kind = ?key.kind, "field cache hit");
            return Ok(hit);
        }
        debug!(kind = ?key.kind, "field cache miss");
        let field = generate(
            config,
            request.dimensionality,
            request.resolution,
            request.seed,
        )?;
        Ok(self.cache.insert(key, field))
    }

    /// All four channels, generated in parallel. The request is validated
    /// first so nothing is computed for an invalid request.
    pub fn resolve_all(&self, request: &GenerationRequest) -> Result<ChannelFields> {
        request.validate()?;
        let resolve =
            |channel: Channel| self.resolve_channel(request.channels.get(channel), request);
        let ((red, green), (blue, alpha)) = rayon::join(
            || rayon::join(|| resolve(Channel::Red), || resolve(Channel::Green)),
            || rayon::join(|| resolve(Channel::Blue), || resolve(Channel::Alpha)),
        );
        Ok(ChannelFields::new(
            request.dimensionality,
            request.resolution,
            [red?, green?, blue?, alpha?],
        ))
    }
}
