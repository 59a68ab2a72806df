use anyhow::{Context, Result};

use crate::crew::pipeline::build_content_pipeline;
use crate::present::{PROCESSING_NOTICE, Section, WORKING_NOTICE, render_terminal};
use crate::session::ContentStudio;

/// One-shot run: the CLI flags play the role of the form fields.
pub async fn run_generate(
    studio: &ContentStudio,
    api_key: Option<String>,
    topic: &str,
    verbose: bool,
) -> Result<Vec<Section>> {
    let mut session = studio.new_session();
    session.set_api_key(api_key.as_deref().unwrap_or_default());
    session.set_topic(topic);
    session.set_verbose(verbose);

    if session.api_key().is_some() {
        eprintln!("{PROCESSING_NOTICE}");
        eprintln!("{WORKING_NOTICE}");
    }

    let sections = studio.generate(&mut session).await;
    print!("{}", render_terminal(&sections));
    Ok(sections)
}

pub fn pipeline_json(topic: &str, verbose: bool) -> Result<String> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(anyhow::anyhow!("topic cannot be empty. Set --topic <text>."));
    }
    let pipeline = build_content_pipeline(topic, verbose);
    pipeline.validate()?;
    serde_json::to_string_pretty(&pipeline).context("failed to serialize pipeline")
}

pub fn run_pipeline_show(topic: &str, verbose: bool) -> Result<()> {
    println!("{}", pipeline_json(topic, verbose)?);
    Ok(())
}
