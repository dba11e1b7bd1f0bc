#![forbid(unsafe_code)]
//! cmdtree demo program
//!
//! `cmdtree git checkout develop`, `cmdtree git push -t b -t c`, `cmdtree demo bob`,
//! or `cmdtree -i` for the wizard. Set `CMDTREE_CONFIG` to load settings from a
//! JSON or YAML file.

use std::process::ExitCode;

use anyhow::Context;
use console::style;
use serde_json::json;

use cmdtree::{ActionContext, AppConfig, Choice, ChoiceEntry, CliApp, CommandNode, Param, StdioMode};

const CONFIG_ENV: &str = "CMDTREE_CONFIG";

fn print_data(ctx: &ActionContext<'_>) -> anyhow::Result<()> {
    println!(
        "{} {}",
        style("→").cyan(),
        style(ctx.command_path().join(" ")).bold()
    );
    println!("{}", serde_json::to_string_pretty(ctx.data())?);
    Ok(())
}

fn git() -> anyhow::Result<CommandNode> {
    let checkout = CommandNode::builder("checkout")
        .description("switch branches")
        .param(
            Param::argument("branch")
                .description("branch to check out")
                .choices([ChoiceEntry::from("master"), ChoiceEntry::item("develop", "dev-branch")])
                .default("master"),
        )
        .action(print_data)
        .build()?;

    let push = CommandNode::builder("push")
        .description("push to a remote (dry run)")
        .param(
            Param::argument("remote")
                .description("remote to push to")
                .choices(["origin", "upstream"])
                .optional()
                .default("origin"),
        )
        .param(
            Param::option("tags")
                .description("tags to push")
                .alias('t')
                .multiple()
                .choices(["a", "b", "c"])
                .defaults(["a"]),
        )
        .action(|ctx| {
            let remote: String = ctx.data().get("remote")?.unwrap_or_default();
            let tags: Vec<String> = ctx.data().get("tags")?.unwrap_or_default();
            let cwd = std::env::current_dir().context("no working directory")?;
            ctx.runner().in_dir(cwd).exec(
                &format!("echo git push {remote} {}", tags.join(" ")),
                StdioMode::Inherit,
                true,
            )?;
            println!("{} pushed {} tag(s)", style("✓").green(), tags.len());
            Ok(())
        })
        .build()?;

    Ok(CommandNode::builder("git")
        .description("git helpers")
        .children([checkout, push])
        .build()?)
}

fn demo() -> anyhow::Result<CommandNode> {
    let colors = [
        ChoiceEntry::from(Choice::with_value("red", json!({ "hex": "#ff0000" })).label("Red")),
        ChoiceEntry::from(Choice::with_value("green", json!({ "hex": "#00ff00" })).label("Green")),
        ChoiceEntry::from("plain"),
    ];

    Ok(CommandNode::builder("demo")
        .description("show every kind of prompt")
        .param(Param::argument("name").description("your name"))
        .param(
            Param::argument("color")
                .description("favourite color")
                .choices(colors)
                .default("red"),
        )
        .param(
            Param::option("toppings")
                .description("pizza toppings")
                .multiple()
                .choices(["cheese", "olives", "basil"])
                .defaults(["cheese", "basil"]),
        )
        .param(
            Param::option("size")
                .description("pizza size")
                .alias('s')
                .computed_choices(|| {
                    ["small", "medium", "large"]
                        .into_iter()
                        .map(ChoiceEntry::from)
                        .collect()
                })
                .default("medium"),
        )
        .param(Param::option("note").description("extra note").optional())
        .action(|ctx| {
            ctx.logger().debug("demo action invoked");
            print_data(ctx)
        })
        .build()?)
}

fn build() -> anyhow::Result<CliApp> {
    let builder = match std::env::var_os(CONFIG_ENV) {
        Some(path) => CliApp::from_config(
            AppConfig::load(&path)
                .with_context(|| format!("failed to load {}", path.to_string_lossy()))?,
        ),
        None => CliApp::builder("cmdtree", cmdtree::VERSION)
            .description("cmdtree demo: one command tree, two ways to run it"),
    };

    Ok(builder.command(git()?).command(demo()?).build()?)
}

fn main() -> ExitCode {
    match build() {
        Ok(app) => app.run(),
        Err(err) => {
            eprintln!("{} {:#}", style("✗").red(), err);
            ExitCode::FAILURE
        }
    }
}
