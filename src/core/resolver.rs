use crate::core::catalog::{Catalog, CatalogError, CatalogStore};
use crate::core::sampler::SampleReport;
use crate::core::signature::Signature;
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use std::path::PathBuf;
use tracing::info;

/// What to show the user for one discovered signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryPrompt {
    /// 1-based position in discovery order.
    pub index: usize,
    pub signature: Signature,
    pub count: usize,
    pub example: PathBuf,
}

/// Supplies a friendly name (possibly empty) for a discovery.
pub trait NameSource {
    /// Called once before the first prompt of a run that found something new.
    fn begin(&mut self, _report: &SampleReport) -> std::io::Result<()> {
        Ok(())
    }

    fn ask(&mut self, prompt: &DiscoveryPrompt) -> std::io::Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    Saved { added: usize },
    Unchanged,
}

/// Build prompts in the order signatures were first discovered.
pub fn prompts(report: &SampleReport) -> Vec<DiscoveryPrompt> {
    report
        .discoveries
        .iter()
        .enumerate()
        .map(|(i, record)| DiscoveryPrompt {
            index: i + 1,
            signature: record.signature.clone(),
            count: record.count,
            example: record.example.clone(),
        })
        .collect()
}

/// Ask for every prompt; blank answers are skipped.
pub fn collect_names<N>(
    prompts: &[DiscoveryPrompt],
    source: &mut N,
) -> std::io::Result<Vec<(Signature, String)>>
where
    N: NameSource + ?Sized,
{
    let mut assignments = Vec::new();
    for prompt in prompts {
        let answer = source.ask(prompt)?;
        let name = answer.trim();
        if !name.is_empty() {
            assignments.push((prompt.signature.clone(), name.to_string()));
        }
    }
    Ok(assignments)
}

/// Merge `assignments` into `catalog` and save it, unless there is nothing to add.
pub fn apply(
    catalog: &mut Catalog,
    store: &CatalogStore,
    assignments: Vec<(Signature, String)>,
) -> Result<ResolveOutcome, CatalogError> {
    if assignments.is_empty() {
        return Ok(ResolveOutcome::Unchanged);
    }

    let added = catalog.merge(assignments);
    store.save(catalog)?;
    info!("Added {} device(s) to the catalog", added);
    Ok(ResolveOutcome::Saved { added })
}

/// Terminal prompt backed by dialoguer.
pub struct DialoguerNames {
    theme: ColorfulTheme,
}

impl DialoguerNames {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for DialoguerNames {
    fn default() -> Self {
        Self::new()
    }
}

impl NameSource for DialoguerNames {
    fn begin(&mut self, _report: &SampleReport) -> std::io::Result<()> {
        println!("\n{}", "=".repeat(50));
        println!("DISCOVERY RESULTS");
        println!("{}", "=".repeat(50));
        Ok(())
    }

    fn ask(&mut self, prompt: &DiscoveryPrompt) -> std::io::Result<String> {
        println!("\n[{}] Signature: {}", prompt.index, prompt.signature);
        println!("    Occurrences found: {}", prompt.count);
        println!("    Example file: {}", prompt.example.display());

        Input::<String>::with_theme(&self.theme)
            .with_prompt("Friendly name for this device (Enter to skip)")
            .allow_empty(true)
            .interact_text()
            .map_err(std::io::Error::other)
    }
}
