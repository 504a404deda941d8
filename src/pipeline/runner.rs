//! Adapter → decorated supplier → materialiser wiring

use super::config::{AdapterConfig, DecoratorsConfig, PipelineConfig};
use super::error::PipelineResult;
use crate::adapter::{Adapter, Content, JsonToLdAdapter, NgsiV2ToLdAdapter};
use crate::error::ConfigError;
use crate::graph::NamedNode;
use crate::jsonld::{
    ChainContextLoader, ContextLoader, FileContextLoader, HttpContextLoader, StaticContextLoader,
};
use crate::materialise::Materialiser;
use crate::supplier::{
    AdaptedMemberSupplier, ExactlyOnceFilter, LatestStateFilter, SupplierChain, Throttle,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of one [`Pipeline::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineReport {
    /// Members that reached the materialiser and were committed.
    pub members: usize,
}

/// One configured ingestion pipeline.
///
/// Members are pulled and materialised one at a time on the caller's
/// thread; the first error stops the run.
pub struct Pipeline {
    adapter: Arc<dyn Adapter>,
    chain: SupplierChain,
    materialiser: Materialiser,
}

impl Pipeline {
    pub fn new(adapter: Arc<dyn Adapter>, chain: SupplierChain, materialiser: Materialiser) -> Self {
        Self {
            adapter,
            chain,
            materialiser,
        }
    }

    /// Build every component from a description. Relative paths (context
    /// files, the store endpoint) resolve against `base_dir`.
    pub fn from_config(config: &PipelineConfig, base_dir: &Path) -> PipelineResult<Self> {
        let loader = context_loader(config, base_dir)?;
        let adapter = build_adapter(&config.adapter, loader)?;
        let chain = build_chain(&config.decorators)?;

        let mut materialiser_config = config.materialiser.clone();
        if let Some(endpoint) = &materialiser_config.endpoint {
            materialiser_config.endpoint = Some(base_dir.join(endpoint));
        }
        let materialiser = Materialiser::open(&materialiser_config)?;

        debug!(decorators = ?chain.applied(), "pipeline built");
        Ok(Self::new(adapter, chain, materialiser))
    }

    pub fn adapter(&self) -> &dyn Adapter {
        self.adapter.as_ref()
    }

    pub fn chain(&self) -> &SupplierChain {
        &self.chain
    }

    pub fn materialiser(&self) -> &Materialiser {
        &self.materialiser
    }

    pub fn run<I>(&self, contents: I) -> PipelineResult<PipelineReport>
    where
        I: IntoIterator<Item = Content>,
        I::IntoIter: Send + 'static,
    {
        let base = AdaptedMemberSupplier::new(Arc::clone(&self.adapter), contents);
        let mut supplier = self.chain.build(Box::new(base));
        let mut report = PipelineReport::default();

        while let Some(member) = supplier.next_member()? {
            debug!(member = member.id(), triples = member.graph().len(), "materialising");
            self.materialiser.process(member.graph())?;
            report.members += 1;
        }

        info!(
            members = report.members,
            repository = self.materialiser.repository_id(),
            "pipeline run finished"
        );
        Ok(report)
    }
}

/// Inline contexts first, then files relative to `base_dir`, then `http(s)`.
fn context_loader(
    config: &PipelineConfig,
    base_dir: &Path,
) -> Result<Arc<dyn ContextLoader>, ConfigError> {
    let inline = config
        .contexts
        .iter()
        .fold(StaticContextLoader::new(), |loader, (reference, document)| {
            loader.with(reference.as_str(), document.clone())
        });
    let http = HttpContextLoader::new()
        .map_err(|e| ConfigError::Invalid(format!("HTTP client for contexts: {}", e)))?;
    Ok(Arc::new(
        ChainContextLoader::new()
            .with(Arc::new(inline))
            .with(Arc::new(FileContextLoader::new(base_dir)))
            .with(Arc::new(http)),
    ))
}

fn build_adapter(
    config: &AdapterConfig,
    loader: Arc<dyn ContextLoader>,
) -> Result<Arc<dyn Adapter>, ConfigError> {
    let adapter: Arc<dyn Adapter> = match config {
        AdapterConfig::Json {
            core_context,
            local_context,
        } => {
            let adapter = JsonToLdAdapter::new(core_context.as_str(), loader)?;
            Arc::new(match local_context {
                Some(local) => adapter.with_local_context(local.as_str()),
                None => adapter,
            })
        }
        AdapterConfig::NgsiV2 {
            data_identifier,
            core_context,
            local_context,
        } => {
            let adapter =
                NgsiV2ToLdAdapter::new(data_identifier.as_str(), core_context.as_str(), loader)?;
            Arc::new(match local_context {
                Some(local) => adapter.with_local_context(local.as_str()),
                None => adapter,
            })
        }
    };
    Ok(adapter)
}

fn build_chain(config: &DecoratorsConfig) -> Result<SupplierChain, ConfigError> {
    let mut chain = SupplierChain::new().with(ExactlyOnceFilter::new(config.exactly_once));
    if let Some(latest) = &config.latest_state {
        let path = |iri: &str| {
            NamedNode::new(iri).map_err(|_| ConfigError::InvalidIri(iri.to_string()))
        };
        chain = chain.with(LatestStateFilter::new(
            latest.enabled,
            path(&latest.version_of_path)?,
            path(&latest.timestamp_path)?,
        ));
    }
    let throttle = Throttle::new(config.members_per_second);
    throttle.validate()?;
    Ok(chain.with(throttle))
}
