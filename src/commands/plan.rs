//! # Plan Command Implementation
//!
//! Displays what `import` would fetch, as a tree of the site nav's import
//! sections. Nothing is fetched and no file is written.

use std::borrow::Cow;
use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use ptree::{print_tree, TreeItem};

use multirepo_docs::output::{emoji, OutputConfig};
use multirepo_docs::phases::{phase1, ImportPlan};
use multirepo_docs::repository::DocsRepo;

use super::SiteArgs;

/// Show the imports of a site config
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub site: SiteArgs,
}

/// Execute the `plan` command.
pub fn execute(args: PlanArgs, output: OutputConfig) -> Result<()> {
    let site = args.site.load()?;
    let plan = phase1::execute(&site.config, &site.plugin, &site.temp_dir)
        .context("Failed to plan imports")?;

    println!(
        "{} Imports of {} into {}",
        emoji(&output, "🗺️", "[PLAN]"),
        site.path.display(),
        site.temp_dir.display()
    );
    if plan.is_empty() {
        println!("  nothing to import");
        return Ok(());
    }

    print_tree(&build_tree(&plan)).context("Failed to display tree")?;
    Ok(())
}

fn build_tree(plan: &ImportPlan) -> TreeNode {
    let (label, repos) = match plan {
        ImportPlan::Nav { .. } => ("nav", plan.repos()),
        ImportPlan::Repos(_) => ("plugins.multirepo.repos", plan.repos()),
        ImportPlan::Empty => ("nothing", Vec::new()),
    };
    TreeNode {
        label: label.to_string(),
        children: repos.into_iter().map(repo_node).collect(),
    }
}

fn repo_node(repo: &DocsRepo) -> TreeNode {
    let mut children = vec![
        leaf(format!("branch: {}", repo.repo.branch)),
        leaf(format!("docs_dir: {}", repo.docs_dir)),
        leaf(format!("edit_uri: {}", repo.edit_uri)),
    ];
    if repo.multi_docs {
        children.push(leaf("multi_docs".to_string()));
    }
    if repo.keep_docs_dir {
        children.push(leaf("keep_docs_dir".to_string()));
    }
    if !repo.extra_imports.is_empty() {
        children.push(leaf(format!("extra_imports: {}", repo.extra_imports.join(", "))));
    }
    TreeNode {
        label: format!("{} <- {}", repo.name(), repo.repo.url),
        children,
    }
}

fn leaf(label: String) -> TreeNode {
    TreeNode {
        label,
        children: Vec::new(),
    }
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: Write>(&self, f: &mut W, _style: &ptree::Style) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}
