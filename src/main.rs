use furigana_ruby::{
    config::{load_config, Config},
    detector,
    error::Result,
    generator::CommandGenerator,
    grammar::{parse_brackets, strip_markup, Segment},
    normalizer::{normalize_boundaries, Normalized},
    output::{print_error, print_notice, print_verbose, Colorize},
    pipeline::{delete_ruby, generate_ruby},
    protect::shield_structural,
    ruby::{brackets_to_markup, FURIGANA_HTML_RE},
    selection::{splice_strategy, EditorPort, SelectionContext, SpliceStrategy},
};
use serde::{Deserialize, Serialize};
use std::io::{self, IsTerminal, Read};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Deserialize)]
struct HookInput {
    #[serde(default)]
    before: String,
    selected: String,
    #[serde(default)]
    after: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HookOutput<'a> {
    html: &'a str,
    changed: bool,
    space_left: bool,
    space_right: bool,
    strategy: &'a str,
}

/// Stdin/stdout adapter for the editing surface: the host pipes the
/// selection triple in as JSON and splices the reply itself.
struct StdioPort {
    input: Option<SelectionContext>,
    changed: bool,
}

impl EditorPort for StdioPort {
    fn selection(&mut self) -> Result<SelectionContext> {
        Ok(self.input.take().unwrap_or_else(|| {
            SelectionContext::new("", "", "")
        }))
    }

    fn replace_selection(
        &mut self,
        normalized: &Normalized,
        strategy: SpliceStrategy,
    ) -> Result<()> {
        let output = HookOutput {
            html: &normalized.html,
            changed: self.changed,
            space_left: normalized.space_left,
            space_right: normalized.space_right,
            strategy: strategy.as_str(),
        };
        println!("{}", serde_json::to_string(&output)?);
        Ok(())
    }
}

/// Read the selection context from stdin, supporting both JSON and plain
/// text formats. Plain text becomes the selected fragment with empty
/// surroundings. Returns None if stdin is a terminal.
fn read_selection_from_stdin() -> Option<SelectionContext> {
    if io::stdin().is_terminal() {
        print_error("No input provided. Pipe a selection to this command:");
        eprintln!("  echo '{{\"selected\": \"漢字\"}}' | furigana-ruby");
        eprintln!("  echo '漢字です' | furigana-ruby --dry-run");
        return None;
    }

    let mut input = String::new();
    if io::stdin().read_to_string(&mut input).is_err() {
        print_error("Failed to read stdin");
        return None;
    }

    if input.trim().is_empty() {
        return Some(SelectionContext::new("", "", ""));
    }

    Some(match serde_json::from_str::<HookInput>(&input) {
        Ok(hook) => SelectionContext::new(hook.before, hook.selected, hook.after),
        Err(_) => SelectionContext::new("", input.trim(), ""),
    })
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|s| s == "--verbose" || s == "-v");

    match args.get(1).map(String::as_str) {
        Some("--version" | "-V") => {
            println!("furigana-ruby {VERSION}");
            return;
        }
        Some("--help" | "-h") => {
            print_help();
            return;
        }
        Some("--dry-run") => {
            handle_dry_run();
            return;
        }
        Some("--render") => {
            handle_render();
            return;
        }
        Some("--delete") => {
            run(Action::Delete, verbose);
            return;
        }
        _ => {}
    }

    run(Action::Generate, verbose);
}

enum Action {
    Generate,
    Delete,
}

fn run(action: Action, verbose: bool) {
    let input = match read_selection_from_stdin() {
        Some(ctx) => ctx,
        None => std::process::exit(1),
    };
    let config = load_config();
    let mut port = StdioPort {
        input: Some(input),
        changed: false,
    };

    let ctx = match port.selection() {
        Ok(ctx) => ctx,
        Err(e) => {
            print_error(&format!("{e}. {}", e.advice()));
            std::process::exit(1);
        }
    };
    if ctx.is_empty() {
        // the host side retries with a select-all fallback before piping to
        // us; an empty triple here means there was nothing at all to work on
        print_notice("Nothing selected");
    }
    print_verbose(
        &format!("Selection length: {} chars", ctx.selected.chars().count()),
        verbose,
    );

    let (normalized, changed) = match action {
        Action::Generate => run_generate(&ctx, &config),
        Action::Delete => run_delete(&ctx, &config, verbose),
    };

    let strategy = splice_strategy(&ctx, &normalized.html);
    print_verbose(&format!("Splice strategy: {}", strategy.as_str()), verbose);
    port.changed = changed;
    if let Err(e) = port.replace_selection(&normalized, strategy) {
        print_error(&format!("{e}. {}", e.advice()));
        std::process::exit(1);
    }
}

fn unmodified(ctx: &SelectionContext) -> Normalized {
    Normalized {
        html: ctx.selected.clone(),
        space_left: false,
        space_right: false,
    }
}

fn run_generate(ctx: &SelectionContext, config: &Config) -> (Normalized, bool) {
    let generator = CommandGenerator::from_config(&config.generator);
    match generate_ruby(&ctx.selected, config, &generator) {
        Ok(outcome) if outcome.changed => (
            normalize_boundaries(&outcome.html, &ctx.before, &ctx.after),
            true,
        ),
        Ok(_) => {
            if config.notify {
                print_notice("Nothing to generate!");
            }
            (unmodified(ctx), false)
        }
        Err(e) => {
            // fall back to the original fragment; the host stays alive
            print_error(&format!("{e}. {}", e.advice()));
            (unmodified(ctx), false)
        }
    }
}

fn run_delete(ctx: &SelectionContext, config: &Config, verbose: bool) -> (Normalized, bool) {
    let outcome = delete_ruby(&ctx.selected);
    if outcome.removed == 0 && config.notify {
        print_notice("No furigana found! Create some first with 'Generate readings'.");
    }
    print_verbose(&format!("Removed {} readings", outcome.removed), verbose);
    // splice back even when unmodified; harmless
    (
        normalize_boundaries(&outcome.html, &ctx.before, &ctx.after),
        outcome.removed > 0,
    )
}

fn preview(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let cut: String = text.chars().take(limit.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

fn handle_dry_run() {
    let ctx = match read_selection_from_stdin() {
        Some(ctx) if !ctx.is_empty() => ctx,
        Some(_) => {
            print_error("No input provided");
            std::process::exit(1);
        }
        None => std::process::exit(1),
    };

    let visible = strip_markup(&ctx.selected);
    let profile = detector::profile(&visible);
    let (shielded, session) =
        shield_structural(&ctx.selected, |caps: &regex::Captures| caps[0].to_string());
    let existing_markup = FURIGANA_HTML_RE.find_iter(&ctx.selected).count();
    let units: Vec<_> = parse_brackets(&shielded)
        .into_iter()
        .filter_map(|s| match s {
            Segment::Unit(u) => Some(u),
            Segment::Plain(_) => None,
        })
        .collect();

    println!("{}", "Dry Run Analysis".bold().underline());
    println!();
    println!("{}: {}", "Kanji Characters".cyan(), profile.han);
    println!("{}: {}", "Kana Characters".cyan(), profile.kana);
    println!(
        "{}: {:.1}%",
        "Annotatable Ratio".cyan(),
        profile.annotatable_ratio() * 100.0
    );
    println!(
        "{}: {}",
        "Would Generate".cyan(),
        if detector::contains_kanji(&shielded) {
            "Yes".green()
        } else {
            "No".yellow()
        }
    );
    println!("{}: {}", "Existing Ruby Elements".cyan(), existing_markup);
    println!("{}: {}", "Bracket Occurrences".cyan(), units.len());
    for unit in &units {
        let flags = match (unit.base_hidden, unit.reading_hidden) {
            (false, false) => "",
            (true, false) => " (base hidden)",
            (false, true) => " (reading hidden)",
            (true, true) => " (both hidden)",
        };
        println!(
            "  {}[{}]{}",
            session.restore(&unit.base),
            session.restore(&unit.reading).dimmed(),
            flags
        );
    }
    println!("{}: {}", "Shielded Segments".cyan(), session.len());
    for seg in session.segments() {
        println!(
            "  {}: {}",
            seg.tag,
            preview(&seg.stored, 50).replace('\n', "\\n").dimmed()
        );
    }
    println!();
    println!(
        "{}: {}",
        "Splice Strategy".cyan(),
        splice_strategy(&ctx, &ctx.selected).as_str()
    );
}

fn handle_render() {
    let ctx = match read_selection_from_stdin() {
        Some(ctx) => ctx,
        None => std::process::exit(1),
    };
    let (html, count) = brackets_to_markup(&ctx.selected);
    let normalized = normalize_boundaries(&html, &ctx.before, &ctx.after);
    let output = HookOutput {
        html: &normalized.html,
        changed: count > 0,
        space_left: normalized.space_left,
        space_right: normalized.space_right,
        strategy: splice_strategy(&ctx, &normalized.html).as_str(),
    };
    match serde_json::to_string(&output) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            print_error(&format!("{e}"));
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!(
        r#"
furigana-ruby - Generate and strip furigana ruby markup for Japanese text

Usage:
  As editor hook:
    The host pipes the selection context on stdin as JSON
    ({{"before": ..., "selected": ..., "after": ...}}) and receives the
    replacement fragment with splice metadata on stdout.

  Commands:
    furigana-ruby                Generate readings for the selection
    furigana-ruby --delete      Strip readings from the selection
    furigana-ruby --render      Convert bracket notation to ruby markup only
    furigana-ruby --dry-run     Preview analysis without running the annotator
    furigana-ruby --verbose, -v Show detailed processing info
    furigana-ruby --version, -V Show version number
    furigana-ruby --help, -h    Show this help message

Environment Variables:
    FURIGANA_READINGS_PATTERN  Override notation pattern (ruby, brackets)
    FURIGANA_GENERATOR_CMD     Override the annotator command

Bracket Notation:
  base[reading] annotates base text with a phonetic reading:
    漢字[かんじ]     plain annotation
    漢字![かんじ]    base rendered hidden
    漢字[!かんじ]    reading rendered hidden

Configuration:
  Create a .furigana.json file in your project or home directory:

  {{
    "readingsPattern": "ruby",
    "notify": true,
    "generator": {{
      "command": "mecab-furigana",
      "args": []
    }}
  }}
"#
    );
}
