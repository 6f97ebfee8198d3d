//! `testhub template add|list|remove`: edit the template library.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use serde_json::Value;
use tabled::{settings::Style, Table, Tabled};

use testhub_core::{Collection, SourceType, Template, TemplateId, TemplatePatch};

use crate::session::Session;

/// Manage library templates.
#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// Add a template, or replace the fields of an existing one.
    Add(AddArgs),

    /// List every template in the library.
    List,

    /// Delete a template. Working copies of it become orphaned.
    Remove {
        /// Template id.
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Permanent template id.
    pub id: String,

    /// Template kind: page | feature | entity.
    #[arg(long = "type", short = 't', value_name = "TYPE")]
    pub template_type: SourceType,

    /// Display name. Entity templates are looked up by this name.
    #[arg(long)]
    pub name: String,

    /// Entity used by the template. Repeat for several.
    #[arg(long = "entity", short = 'e', value_name = "ENTITY")]
    pub entities: Vec<String>,

    /// Template body. Parsed as JSON when possible, otherwise kept as text.
    #[arg(long)]
    pub content: Option<String>,

    /// JSON schema of an entity template.
    #[arg(long)]
    pub schema: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
}

pub fn run(cmd: TemplateCommand) -> Result<()> {
    let session = Session::open()?;
    match cmd {
        TemplateCommand::Add(args) => add(&session, args),
        TemplateCommand::List => list(&session),
        TemplateCommand::Remove { id } => remove(&session, &id),
    }
}

fn add(session: &Session, args: AddArgs) -> Result<()> {
    let schema = args
        .schema
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--schema must be valid JSON")?;
    let content = args.content.as_deref().map(parse_content).unwrap_or_default();
    let id = TemplateId::from(args.id);

    session.block_on(async {
        let existing = session
            .templates
            .get(&id)
            .await
            .with_context(|| format!("failed to read template '{id}'"))?;
        match existing {
            Some(current) => {
                if current.template_type != args.template_type {
                    anyhow::bail!(
                        "template '{id}' already exists as a {}",
                        current.template_type
                    );
                }
                let patch = TemplatePatch {
                    name: Some(args.name),
                    entities_used: Some(args.entities),
                    schema: Some(schema),
                    description: Some(args.description),
                    content: Some(content),
                };
                session
                    .templates
                    .update(&id, patch)
                    .await
                    .with_context(|| format!("failed to update template '{id}'"))?;
                println!("✓ Updated {} template '{id}'", args.template_type);
            }
            None => {
                let template = Template {
                    id: id.clone(),
                    template_type: args.template_type,
                    name: args.name,
                    entities_used: args.entities,
                    schema,
                    description: args.description,
                    content,
                    updated_at: Utc::now(),
                };
                session
                    .templates
                    .create(template)
                    .await
                    .with_context(|| format!("failed to add template '{id}'"))?;
                println!("✓ Added {} template '{id}'", args.template_type);
            }
        }
        Ok::<(), anyhow::Error>(())
    })
}

fn parse_content(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "type")]
    template_type: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "entities")]
    entities: String,
    #[tabled(rename = "updated")]
    updated: String,
}

fn list(session: &Session) -> Result<()> {
    let templates = session
        .block_on(session.templates.list())
        .context("failed to load templates")?;
    if templates.is_empty() {
        println!("No templates in the library.");
        println!("Run: testhub template add <id> --type page --name <name>");
        return Ok(());
    }

    let rows: Vec<TemplateRow> = templates
        .into_iter()
        .map(|t| TemplateRow {
            id: t.id.to_string(),
            template_type: t.template_type.to_string(),
            name: t.name,
            entities: t.entities_used.join(", "),
            updated: t.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn remove(session: &Session, id: &str) -> Result<()> {
    session
        .block_on(session.templates.delete(&TemplateId::from(id)))
        .with_context(|| format!("failed to remove template '{id}'"))?;
    println!("✓ Removed template '{id}'");
    Ok(())
}
