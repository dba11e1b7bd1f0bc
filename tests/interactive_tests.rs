//! Interactive mode integration tests
//!
//! The wizard driven end to end through `CliApp` with scripted answers.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cmdtree::binder::SELECT_COMMAND;
use cmdtree::{
    Answer, AppConfig, ChoiceEntry, CliApp, CliError, CommandBuilder, CommandNode, Logger, Outcome,
    Param, ScriptedPrompter,
};
use serde_json::{json, Value};

type Seen = Rc<RefCell<Vec<(Vec<String>, Value)>>>;

fn record(seen: &Seen, node: CommandBuilder) -> CommandBuilder {
    let seen = Rc::clone(seen);
    node.action(move |ctx| {
        let data = serde_json::to_value(ctx.data())?;
        seen.borrow_mut().push((ctx.command_path().to_vec(), data));
        Ok(())
    })
}

fn forest(seen: &Seen) -> Vec<CommandNode> {
    let checkout = record(
        seen,
        CommandNode::builder("checkout").param(
            Param::argument("branch")
                .choices([ChoiceEntry::from("master"), ChoiceEntry::item("develop", "dev-branch")])
                .default("master"),
        ),
    )
    .build()
    .unwrap();
    let git = record(seen, CommandNode::builder("git").description("git helpers"))
        .child(checkout)
        .build()
        .unwrap();
    let demo = record(
        seen,
        CommandNode::builder("demo")
            .param(Param::argument("name").description("your name"))
            .param(
                Param::option("toppings")
                    .multiple()
                    .choices(["cheese", "olives", "basil"])
                    .defaults(["cheese"]),
            ),
    )
    .build()
    .unwrap();
    vec![git, demo]
}

fn app(seen: &Seen) -> CliApp {
    CliApp::builder("cli", "1.0.0")
        .logger(Logger::console_only("cli"))
        .commands(forest(seen))
        .build()
        .unwrap()
}

// =============================================================================
// Walking the tree
// =============================================================================

mod walk_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inner_node_reprompts_and_is_never_dispatched() {
        let seen = Seen::default();
        let app = app(&seen);
        let mut prompter = ScriptedPrompter::new([
            Answer::choose("git"),
            Answer::choose("checkout"),
            Answer::choose("develop"),
        ]);

        let outcome = app.execute_with(["cli", "-i"], &mut prompter).unwrap();
        assert_eq!(outcome, Outcome::Dispatched(vec!["git".into(), "checkout".into()]));
        assert_eq!(prompter.asked()[0], SELECT_COMMAND);
        assert_eq!(prompter.asked()[1], SELECT_COMMAND);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, vec!["git", "checkout"]);
        assert_eq!(seen[0].1, json!({ "branch": "dev-branch" }));
    }

    #[test]
    fn test_leaf_prompts_in_declaration_order() {
        let seen = Seen::default();
        let app = app(&seen);
        let mut prompter = ScriptedPrompter::new([
            Answer::choose("demo"),
            Answer::text("bob"),
            Answer::choose_many(["basil", "olives"]),
        ]);

        app.execute_with(["cli", "--interactive"], &mut prompter).unwrap();
        assert_eq!(prompter.asked(), [SELECT_COMMAND, "your name", "toppings"]);
        assert_eq!(
            seen.borrow()[0].1,
            json!({ "name": "bob", "toppings": ["basil", "olives"] })
        );
    }

    #[test]
    fn test_accepting_preselected_defaults() {
        let seen = Seen::default();
        let app = app(&seen);
        let mut prompter = ScriptedPrompter::new([
            Answer::choose("git"),
            Answer::choose("checkout"),
            Answer::Accept,
        ]);

        app.execute_with(["cli", "-i"], &mut prompter).unwrap();
        assert_eq!(seen.borrow()[0].1, json!({ "branch": "master" }));
    }
}

// =============================================================================
// Entering and leaving the wizard
// =============================================================================

mod mode_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cancel_dispatches_nothing() {
        let seen = Seen::default();
        let app = app(&seen);
        let mut prompter = ScriptedPrompter::new([Answer::choose("demo"), Answer::Cancel]);

        let outcome = app.execute_with(["cli", "-i"], &mut prompter).unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(outcome.exit_code(), 0);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_subcommand_wins_over_the_flag() {
        let seen = Seen::default();
        let app = app(&seen);
        let mut prompter = ScriptedPrompter::default();

        let outcome = app
            .execute_with(["cli", "-i", "demo", "ann"], &mut prompter)
            .unwrap();
        assert_eq!(outcome, Outcome::Dispatched(vec!["demo".into()]));
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn test_config_can_make_the_wizard_the_default() {
        let seen = Seen::default();
        let mut config = AppConfig::new("cli", "1.0.0");
        config.interactive = true;
        let app = CliApp::from_config(config)
            .logger(Logger::console_only("cli"))
            .commands(forest(&seen))
            .build()
            .unwrap();
        let mut prompter = ScriptedPrompter::new([Answer::Cancel]);

        assert_eq!(app.execute_with(["cli"], &mut prompter).unwrap(), Outcome::Cancelled);
        assert_eq!(prompter.asked(), [SELECT_COMMAND]);
    }

    #[test]
    fn test_computed_choices_evaluated_once_in_the_wizard() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let pick = CommandNode::builder("pick")
            .param(Param::argument("fruit").computed_choices(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                vec!["apple".into(), "pear".into()]
            }))
            .action(|_| Ok(()))
            .build()
            .unwrap();
        let app = CliApp::builder("cli", "1.0.0")
            .logger(Logger::console_only("cli"))
            .command(pick)
            .build()
            .unwrap();
        let mut prompter = ScriptedPrompter::new([Answer::choose("pick"), Answer::choose("pear")]);

        app.execute_with(["cli", "-i"], &mut prompter).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_computed_default_outside_its_choices_stops_the_wizard() {
        let pick = CommandNode::builder("pick")
            .param(
                Param::option("size")
                    .computed_choices(|| vec!["small".into(), "large".into()])
                    .default("huge"),
            )
            .action(|_| panic!("must not dispatch"))
            .build()
            .unwrap();
        let app = CliApp::builder("cli", "1.0.0")
            .logger(Logger::console_only("cli"))
            .command(pick)
            .build()
            .unwrap();
        let mut prompter = ScriptedPrompter::new([Answer::choose("pick"), Answer::choose("large")]);

        let err = app.execute_with(["cli", "-i"], &mut prompter).unwrap_err();
        assert!(matches!(err, CliError::Configuration(_)));
        assert_eq!(prompter.remaining(), 1);
    }
}
