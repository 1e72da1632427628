use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;
use stackit_editor_core::{
    EditorConfig, FormatCommand, InputEvent, RichTextEditor, SanitizePolicy, Selection,
    render_preview,
};

#[derive(Parser)]
#[command(version, about = "stackit-editor - headless driver for the question editor", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Editor config file (.toml or .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted editing session and print every emitted value
    Run {
        /// Session script (.toml or .json)
        script: PathBuf,
    },
    /// Render a stored value the way the preview pane shows it
    Preview {
        /// File holding the markup
        source: PathBuf,

        /// Render the markup as stored, without sanitizing
        #[arg(long)]
        trusted: bool,
    },
}

/// A scripted editing session.
#[derive(Debug, Deserialize)]
struct Script {
    /// Value the host holds when the editor mounts.
    #[serde(default)]
    initial: String,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
enum Step {
    Focus,
    Blur,
    Select { anchor: usize, head: usize },
    SelectAll,
    Type { text: String },
    Paste { text: String },
    Key { key: Key },
    Command { command: FormatCommand },
    /// Either a literal glyph or a position in the configured palette.
    Emoji {
        #[serde(default)]
        glyph: Option<String>,
        #[serde(default)]
        index: Option<usize>,
    },
    Link { text: String, url: String },
    Image { path: PathBuf },
    /// The host changes its value on its own, e.g. a form reset.
    External { value: String },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum Key {
    Enter,
    ShiftEnter,
    Backspace,
    Delete,
}

impl Key {
    fn event(self) -> InputEvent {
        match self {
            Key::Enter => InputEvent::InsertParagraph,
            Key::ShiftEnter => InputEvent::InsertLineBreak,
            Key::Backspace => InputEvent::DeleteBackward,
            Key::Delete => InputEvent::DeleteForward,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EditorConfig::load(path).into_diagnostic()?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Commands::Run { script } => run_script(&script, config).await?,
        Commands::Preview { source, trusted } => {
            let value = std::fs::read_to_string(&source).into_diagnostic()?;
            let policy = if trusted {
                SanitizePolicy::Trusted
            } else {
                config.sanitize_policy
            };
            println!("{}", render_preview(&value, policy));
        }
    }

    Ok(())
}

fn load_script(path: &Path) -> Result<Script> {
    let source = std::fs::read_to_string(path).into_diagnostic()?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&source).into_diagnostic(),
        Some("toml") => toml::from_str(&source).into_diagnostic(),
        _ => Err(miette::miette!(
            "Unsupported script format: {}",
            path.display()
        )),
    }
}

async fn run_script(path: &Path, config: EditorConfig) -> Result<()> {
    let script = load_script(path)?;
    let policy = config.sanitize_policy;

    let emitted: Rc<RefCell<Vec<String>>> = Rc::default();
    let sink = {
        let emitted = emitted.clone();
        move |value: &str| emitted.borrow_mut().push(value.to_owned())
    };
    let mut editor = RichTextEditor::mount(&script.initial, config, sink);
    println!("mounted: {}", editor.value());

    for (index, step) in script.steps.into_iter().enumerate() {
        let before = emitted.borrow().len();
        let outcome = apply_step(&mut editor, step).await;
        if let Err(error) = outcome {
            tracing::warn!(step = index, %error, "step rejected");
            println!("[{index}] rejected: {error}");
        }
        for value in &emitted.borrow()[before..] {
            println!("[{index}] emit: {value}");
        }
    }

    println!("value: {}", editor.value());
    println!("selection: {:?}", editor.selection());
    if let Some(placeholder) = editor.placeholder() {
        println!("placeholder: {placeholder}");
    }
    println!("preview: {}", render_preview(&editor.value(), policy));
    editor.teardown();
    Ok(())
}

async fn apply_step<S>(
    editor: &mut RichTextEditor<S>,
    step: Step,
) -> std::result::Result<(), stackit_editor_core::InsertionError>
where
    S: stackit_editor_core::ChangeSink,
{
    match step {
        Step::Focus => editor.focus(),
        Step::Blur => editor.blur(),
        Step::Select { anchor, head } => editor.set_selection(Selection::new(anchor, head)),
        Step::SelectAll => editor.select_all(),
        Step::Type { text } => {
            editor.handle_input(&InputEvent::InsertText(text));
        }
        Step::Paste { text } => {
            editor.handle_input(&InputEvent::InsertFromPaste(text));
        }
        Step::Key { key } => {
            editor.handle_input(&key.event());
        }
        Step::Command { command } => {
            editor.execute(&command);
        }
        Step::Emoji { glyph, index } => {
            editor.toggle_emoji_picker();
            let glyph = match (glyph, index) {
                (Some(glyph), _) => glyph,
                (None, Some(index)) => editor
                    .emoji_palette()
                    .get(index)
                    .map(|g| g.to_string())
                    .unwrap_or_default(),
                (None, None) => String::new(),
            };
            let inserted = editor.insert_emoji(&glyph);
            if inserted.is_err() {
                editor.close_picker();
            }
            inserted?;
        }
        Step::Link { text, url } => {
            editor.open_link_modal();
            editor.set_link_text(text);
            editor.set_link_url(url);
            let submitted = editor.submit_link();
            if submitted.is_err() {
                editor.cancel_link();
            }
            submitted?;
        }
        Step::Image { path } => {
            let completion = editor.begin_image_insertion().read_file(&path).await;
            editor.finish_image_insertion(completion)?;
        }
        Step::External { value } => {
            editor.sync_external(&value);
        }
    }
    Ok(())
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_toml() {
        let script: Script = toml::from_str(
            r#"
            initial = "<p>Hello</p>"

            [[steps]]
            action = "select"
            anchor = 0
            head = 5

            [[steps]]
            action = "command"
            command = "bold"

            [[steps]]
            action = "key"
            key = "shift-enter"

            [[steps]]
            action = "command"
            command = { insert-markup = "<hr>" }
            "#,
        )
        .unwrap();
        assert_eq!(script.initial, "<p>Hello</p>");
        assert_eq!(script.steps.len(), 4);
        assert!(matches!(
            script.steps[1],
            Step::Command {
                command: FormatCommand::Bold
            }
        ));
        assert!(matches!(
            &script.steps[3],
            Step::Command { command: FormatCommand::InsertMarkup(m) } if m == "<hr>"
        ));
    }

    #[tokio::test]
    async fn test_apply_steps() {
        let emitted: Rc<RefCell<Vec<String>>> = Rc::default();
        let sink = {
            let emitted = emitted.clone();
            move |value: &str| emitted.borrow_mut().push(value.to_owned())
        };
        let mut editor = RichTextEditor::mount("<p>Hello</p>", EditorConfig::default(), sink);
        let steps = vec![
            Step::Select { anchor: 0, head: 5 },
            Step::Command {
                command: FormatCommand::Bold,
            },
            Step::Select { anchor: 5, head: 5 },
            Step::Emoji {
                glyph: None,
                index: Some(4),
            },
            Step::Emoji {
                glyph: None,
                index: Some(99),
            },
            Step::Link {
                text: "".into(),
                url: "https://example.com".into(),
            },
            Step::External {
                value: "<p>Reset</p>".into(),
            },
        ];
        let mut rejected = 0;
        for step in steps {
            if apply_step(&mut editor, step).await.is_err() {
                rejected += 1;
            }
        }
        assert_eq!(rejected, 2);
        assert_eq!(
            *emitted.borrow(),
            vec!["<p><b>Hello</b></p>", "<p><b>Hello🤔</b></p>"]
        );
        assert_eq!(editor.value(), "<p>Reset</p>");
    }
}
