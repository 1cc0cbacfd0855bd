use std::error::Error;
use std::fs;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, error::ErrorKind};

use crate::config::LabelerConfig;
use crate::constants::source::{ENV_MAPPING_CSV, ENV_RESULTS_DIR, ENV_VIDEO_ROOT};
use crate::mapping::MappingTable;
use crate::resolver::Resolution;
use crate::session::{ItemView, LabelingSession};
use crate::source::{
    DirectoryCatalog, JsonlLoader, LoadedSource, SourceCatalog, SourceLocator, SourceMode,
};
use crate::transport::fs::display_name;

#[derive(Debug, Parser)]
#[command(
    name = "mos_label",
    disable_help_subcommand = true,
    about = "Score generated video captions on a 1-5 opinion scale",
    long_about = "Walk JSON-lines caption records, resolve each video through a mapping table, and record per-rater 1-5 scores exported as CSV.",
    after_help = "Input modes are tried in order: results-directory listing, --source-file, then --upload. Paths fall back to MOS_RESULTS_DIR, MOS_MAPPING_CSV, and MOS_VIDEO_ROOT. Scores are saved to <source>_<rater>.csv after every change."
)]
/// CLI for `mos_label`.
///
/// Commands read from stdin, one per line:
/// - `n`/`next`, `p`/`prev`, `g <n>`/`goto <n>` (1-based)
/// - `s <1-5>`/`score <1-5>`, `r <name>`/`rater <name>`
/// - `show`, `stat`, `export`, `help`, `q`/`quit`
///
/// Each score is written to the rater's export file immediately.
struct LabelCli {
    #[command(flatten)]
    input: InputArgs,
    #[arg(long, value_name = "NAME", help = "Rater name (blank uses the placeholder)")]
    rater: Option<String>,
    #[arg(
        long = "no-resume",
        help = "Ignore the rater's existing export instead of restoring it"
    )]
    no_resume: bool,
    #[arg(
        long = "export-dir",
        value_name = "DIR",
        help = "Directory for score exports (defaults to the results directory)"
    )]
    export_dir: Option<PathBuf>,
}

#[derive(Debug, Parser)]
#[command(
    name = "inspect_source",
    disable_help_subcommand = true,
    about = "Print normalized records and video resolutions",
    long_about = "Load a JSON-lines source through the input-mode fallback and print each canonical record with its resolved video reference."
)]
struct InspectCli {
    #[command(flatten)]
    input: InputArgs,
    #[arg(long = "list", help = "List catalog entries and exit")]
    list_only: bool,
}

#[derive(Debug, clap::Args)]
struct InputArgs {
    #[arg(
        long = "results-dir",
        value_name = "DIR",
        help = "Directory listing *.jsonl sources"
    )]
    results_dir: Option<PathBuf>,
    #[arg(
        long,
        value_name = "NAME",
        help = "Catalog entry to load (defaults to the first listed)"
    )]
    source: Option<String>,
    #[arg(long = "source-file", value_name = "PATH", help = "Direct JSON-lines file path")]
    source_file: Option<PathBuf>,
    #[arg(long, value_name = "PATH", help = "File read as an uploaded JSON-lines payload")]
    upload: Option<PathBuf>,
    #[arg(long, value_name = "PATH", help = "Mapping CSV (name,url,file_id,type)")]
    mapping: Option<PathBuf>,
    #[arg(
        long = "video-root",
        value_name = "DIR",
        help = "Local directory probed when mapping lookup fails"
    )]
    video_root: Option<PathBuf>,
}

impl InputArgs {
    fn config(&self, env: &dyn Fn(&str) -> Option<String>) -> LabelerConfig {
        let results_dir = resolve_path(self.results_dir.clone(), ENV_RESULTS_DIR, env);
        let mut config = match results_dir {
            Some(dir) => LabelerConfig::new(dir),
            None => LabelerConfig::default(),
        };
        if let Some(root) = resolve_path(self.video_root.clone(), ENV_VIDEO_ROOT, env) {
            config = config.with_video_root(root);
        }
        if let Some(path) = resolve_path(self.mapping.clone(), ENV_MAPPING_CSV, env) {
            config = config.with_mapping_csv(path);
        }
        config
    }

    fn locator(&self, config: &LabelerConfig) -> Result<SourceLocator, Box<dyn Error>> {
        let catalog = DirectoryCatalog::new(&config.results_dir);
        let mut locator = SourceLocator::new(JsonlLoader::new(config.aliases.clone()))
            .with_mode(match &self.source {
                Some(name) => SourceMode::catalog_entry(catalog, name.clone()),
                None => SourceMode::catalog(catalog),
            });
        if let Some(path) = &self.source_file {
            locator = locator.with_mode(SourceMode::File(path.clone()));
        }
        if let Some(path) = &self.upload {
            locator = locator.with_mode(SourceMode::Upload {
                name: Some(display_name(path)),
                bytes: fs::read(path)?,
            });
        }
        Ok(locator)
    }
}

/// Explicit value, then environment variable, else `None`.
fn resolve_path(
    explicit: Option<PathBuf>,
    env_key: &str,
    env: &dyn Fn(&str) -> Option<String>,
) -> Option<PathBuf> {
    explicit.or_else(|| {
        env(env_key)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
    })
}

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Load the mapping table named in `config`, if any.
///
/// A table that fails to load is reported and the session continues without one.
fn load_mapping<W: Write>(
    config: &LabelerConfig,
    out: &mut W,
) -> Result<Option<MappingTable>, Box<dyn Error>> {
    let Some(path) = &config.mapping_csv else {
        return Ok(None);
    };
    match MappingTable::from_path(path) {
        Ok(table) => {
            writeln!(
                out,
                "mapping: {} entries from {}",
                table.len(),
                path.display()
            )?;
            Ok(Some(table))
        }
        Err(err) => {
            writeln!(out, "mapping unavailable: {err}")?;
            Ok(None)
        }
    }
}

/// Run the interactive labeling loop over `input`, writing to `out`.
pub fn run_labeling_session<I, R, W>(args_iter: I, input: R, out: &mut W) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
    R: BufRead,
    W: Write,
{
    run_labeling_session_with_env(args_iter, input, out, &process_env)
}

fn run_labeling_session_with_env<I, R, W>(
    args_iter: I,
    input: R,
    out: &mut W,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
    R: BufRead,
    W: Write,
{
    let Some(cli) =
        parse_cli::<LabelCli, _>(std::iter::once("mos_label".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };
    let config = cli.input.config(env);
    let source = cli.input.locator(&config)?.locate()?;
    report_skipped(&source, out)?;
    let mapping = load_mapping(&config, out)?;

    let mut session = LabelingSession::open(source, &config)?;
    session.set_mapping(mapping);
    session.set_rater(cli.rater.as_deref().unwrap_or_default());
    let export_dir = cli
        .export_dir
        .clone()
        .unwrap_or_else(|| config.results_dir.clone());

    let resume = !cli.no_resume;
    if resume {
        report_resume(session.resume_from_dir(&export_dir)?, out)?;
    }

    render_item(&session.view(), out)?;
    for line in input.lines() {
        let line = line?;
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(out, "{message}")?;
                continue;
            }
        };
        match command {
            Command::Next => {
                session.next_item();
                render_item(&session.view(), out)?;
            }
            Command::Prev => {
                session.prev_item();
                render_item(&session.view(), out)?;
            }
            Command::Goto(position) => {
                session.goto(position.saturating_sub(1));
                render_item(&session.view(), out)?;
            }
            Command::Show => render_item(&session.view(), out)?,
            Command::Score(value) => match session.score_current(value) {
                Ok(entry) => {
                    let saved = format!("saved: id={}, score={}", entry.record_id, entry.score);
                    let path = session.export_to_dir(&export_dir)?;
                    writeln!(out, "{saved} -> {}", path.display())?;
                }
                Err(err) => writeln!(out, "{err}")?,
            },
            Command::Rater(name) => {
                session.set_rater(&name);
                writeln!(out, "rater: {}", session.rater())?;
                if resume {
                    report_resume(session.resume_from_dir(&export_dir)?, out)?;
                }
            }
            Command::Stat => render_progress(&session, out)?,
            Command::Export => {
                let path = session.export_to_dir(&export_dir)?;
                let rows = session.scores().entries_for_rater(session.rater()).count();
                writeln!(out, "exported {rows} row(s) to {}", path.display())?;
            }
            Command::Help => writeln!(out, "{COMMAND_HELP}")?,
            Command::Quit => break,
        }
    }
    Ok(())
}

/// Print normalized records and their resolutions.
pub fn run_inspect_source<I, W>(args_iter: I, out: &mut W) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
    W: Write,
{
    run_inspect_source_with_env(args_iter, out, &process_env)
}

fn run_inspect_source_with_env<I, W>(
    args_iter: I,
    out: &mut W,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
    W: Write,
{
    let Some(cli) =
        parse_cli::<InspectCli, _>(std::iter::once("inspect_source".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };
    let config = cli.input.config(env);
    if cli.list_only {
        for name in DirectoryCatalog::new(&config.results_dir).list()? {
            writeln!(out, "{name}")?;
        }
        return Ok(());
    }
    let source = cli.input.locator(&config)?.locate()?;
    report_skipped(&source, out)?;
    let mapping = load_mapping(&config, out)?;
    let mut session = LabelingSession::open(source, &config)?;
    session.set_mapping(mapping);
    let mut resolved = 0usize;
    for idx in 0..session.len() {
        session.goto(idx);
        let view = session.view();
        if view.resolution.is_resolved() {
            resolved += 1;
        }
        render_item(&view, out)?;
    }
    writeln!(out, "resolved {resolved}/{} video(s)", session.len())?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Next,
    Prev,
    Goto(usize),
    Show,
    Score(i64),
    Rater(String),
    Stat,
    Export,
    Help,
    Quit,
}

const COMMAND_HELP: &str = "commands: n|next, p|prev, g|goto <n>, s|score <1-5>, r|rater <name>, show, stat, export, help, q|quit";

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let command = match verb.to_ascii_lowercase().as_str() {
        "n" | "next" => Command::Next,
        "p" | "prev" => Command::Prev,
        "g" | "goto" => Command::Goto(
            rest.parse::<usize>()
                .map_err(|_| format!("goto expects a 1-based item number, got '{rest}'"))?,
        ),
        "s" | "score" => Command::Score(
            rest.parse::<i64>()
                .map_err(|_| format!("score expects an integer 1-5, got '{rest}'"))?,
        ),
        "r" | "rater" => Command::Rater(rest.to_string()),
        "show" => Command::Show,
        "stat" => Command::Stat,
        "export" => Command::Export,
        "h" | "help" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{other}'; {COMMAND_HELP}")),
    };
    Ok(Some(command))
}

fn report_resume<W: Write>(
    resumed: Option<(PathBuf, usize)>,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    if let Some((path, restored)) = resumed {
        writeln!(out, "resumed {restored} score(s) from {}", path.display())?;
    }
    Ok(())
}

fn report_skipped<W: Write>(source: &LoadedSource, out: &mut W) -> Result<(), Box<dyn Error>> {
    writeln!(
        out,
        "source: {} ({} record(s), {} line(s) skipped)",
        source.name,
        source.len(),
        source.skipped.len()
    )?;
    Ok(())
}

fn render_item<W: Write>(view: &ItemView<'_>, out: &mut W) -> Result<(), Box<dyn Error>> {
    let record = view.record;
    writeln!(out, "--- item {} / {} (id={}) ---", view.position, view.total, record.id)?;
    match &view.resolution {
        Resolution::Direct { url, matched } => writeln!(out, "video: {url} [{matched}]")?,
        Resolution::Drive { links, matched } => {
            writeln!(out, "video: {} [{matched}]", links.preview)?;
            writeln!(out, "  open: {}", links.open)?;
            writeln!(out, "  download: {}", links.download)?;
        }
        Resolution::Local { path } => writeln!(out, "video: {}", path.display())?,
        Resolution::Unresolved(reason) => writeln!(out, "video unavailable: {reason}")?,
    }
    writeln!(out, "prompt: {}", record.prompt.as_deref().unwrap_or("(none)"))?;
    writeln!(out, "answer: {}", record.answer.as_deref().unwrap_or("(none)"))?;
    let origin = if view.scored { "saved" } else { "default" };
    writeln!(out, "score: {} ({origin})", view.score)?;
    Ok(())
}

fn render_progress<W: Write>(session: &LabelingSession, out: &mut W) -> Result<(), Box<dyn Error>> {
    let progress = session.progress();
    writeln!(
        out,
        "rater {}: {}/{} scored ({:.0}%), {} remaining",
        session.rater(),
        progress.scored,
        progress.total,
        progress.completion() * 100.0,
        progress.remaining
    )?;
    match progress.mean_score {
        Some(mean) => writeln!(out, "mean score: {mean:.2}")?,
        None => writeln!(out, "mean score: -")?,
    }
    let histogram: Vec<String> = progress
        .histogram
        .iter()
        .enumerate()
        .map(|(idx, count)| format!("{}:{count}", idx + 1))
        .collect();
    writeln!(out, "histogram: {}", histogram.join(" "))?;
    Ok(())
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values
            .iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn parse_command_accepts_aliases_and_reports_errors() {
        assert_eq!(parse_command("n"), Ok(Some(Command::Next)));
        assert_eq!(parse_command("  score 4 "), Ok(Some(Command::Score(4))));
        assert_eq!(parse_command("g 3"), Ok(Some(Command::Goto(3))));
        assert_eq!(
            parse_command("rater jy kim"),
            Ok(Some(Command::Rater("jy kim".into())))
        );
        assert_eq!(parse_command(""), Ok(None));
        assert!(parse_command("score high").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn resolve_path_prefers_explicit_then_env() {
        let env = |key: &str| (key == ENV_RESULTS_DIR).then(|| "/from/env".to_string());
        assert_eq!(
            resolve_path(Some(PathBuf::from("/explicit")), ENV_RESULTS_DIR, &env),
            Some(PathBuf::from("/explicit"))
        );
        assert_eq!(
            resolve_path(None, ENV_RESULTS_DIR, &env),
            Some(PathBuf::from("/from/env"))
        );
        assert_eq!(resolve_path(None, ENV_VIDEO_ROOT, &env), None);
    }

    #[test]
    fn labeling_loop_scores_and_exports() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("run.jsonl"),
            "{\"id\": 1, \"video\": \"v/a.mp4\", \"prompt\": \"p1\", \"answer\": \"a1\"}\n\
             {\"id\": 2, \"video\": \"v/b.mp4\", \"prompt\": \"p2\", \"answer\": \"a2\"}\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("map.csv"),
            "name,url,file_id\na__cv2.mp4,https://cdn/a.mp4,\nb.mp4,,F9\n",
        )
        .unwrap();

        let results = temp.path().to_string_lossy().to_string();
        let mapping = temp.path().join("map.csv").to_string_lossy().to_string();
        let commands = "s 2\ns 5\nn\nscore 1\nstat\nexport\nq\nn\n";
        let mut out = Vec::new();
        run_labeling_session_with_env(
            args(&["--results-dir", &results, "--mapping", &mapping, "--rater", "jykim"]),
            commands.as_bytes(),
            &mut out,
            &no_env,
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("video: https://cdn/a.mp4 [a__cv2.mp4]"));
        assert!(text.contains("https://drive.google.com/file/d/F9/preview"));
        assert!(text.contains("rater jykim: 2/2 scored"));
        assert!(text.contains("mean score: 3.00"));

        let exported = fs::read_to_string(temp.path().join("run_jykim.csv")).unwrap();
        let rows: Vec<&str> = exported.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].starts_with("1,a.mp4,jykim,5,"));
        assert!(rows[2].starts_with("2,b.mp4,jykim,1,"));
    }

    #[test]
    fn scores_are_saved_without_explicit_export() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("run.jsonl"), "{\"id\": \"x\", \"video\": \"x.mp4\"}\n").unwrap();
        let results = temp.path().to_string_lossy().to_string();
        let mut out = Vec::new();
        run_labeling_session_with_env(
            args(&["--results-dir", &results, "--rater", "jykim"]),
            "s 4\nq\n".as_bytes(),
            &mut out,
            &no_env,
        )
        .unwrap();

        let exported = fs::read_to_string(temp.path().join("run_jykim.csv")).unwrap();
        let rows: Vec<&str> = exported.lines().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[1].starts_with("x,x.mp4,jykim,4,"));
    }

    #[test]
    fn switching_rater_restores_that_raters_export() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("run.jsonl"), "{\"id\": \"x\"}\n").unwrap();
        fs::write(
            temp.path().join("run_second.csv"),
            "id,video,rater,score,updated_at\nx,,second,2,2025-01-01T00:00:00Z\n",
        )
        .unwrap();
        let results = temp.path().to_string_lossy().to_string();
        let mut out = Vec::new();
        run_labeling_session_with_env(
            args(&["--results-dir", &results, "--rater", "jykim"]),
            "s 5\nr second\nshow\nq\n".as_bytes(),
            &mut out,
            &no_env,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("resumed 1 score(s)"));
        assert!(text.contains("score: 2 (saved)"));
        let first = fs::read_to_string(temp.path().join("run_jykim.csv")).unwrap();
        assert!(!first.contains("second"));
    }

    #[test]
    fn no_resume_ignores_existing_export() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("run.jsonl"), "{\"id\": \"x\"}\n").unwrap();
        fs::write(
            temp.path().join("run_jykim.csv"),
            "id,video,rater,score,updated_at\nx,,jykim,4,2025-01-01T00:00:00Z\n",
        )
        .unwrap();
        let results = temp.path().to_string_lossy().to_string();
        let mut out = Vec::new();
        run_labeling_session_with_env(
            args(&["--results-dir", &results, "--rater", "jykim", "--no-resume"]),
            "q\n".as_bytes(),
            &mut out,
            &no_env,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("resumed"));
        assert!(text.contains("score: 3 (default)"));
    }

    #[test]
    fn existing_export_is_restored_on_start() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("run.jsonl"), "{\"id\": \"x\"}\n").unwrap();
        fs::write(
            temp.path().join("run_jykim.csv"),
            "id,video,rater,score,updated_at\nx,,jykim,4,2025-01-01T00:00:00Z\n",
        )
        .unwrap();
        let results = temp.path().to_string_lossy().to_string();
        let mut out = Vec::new();
        run_labeling_session_with_env(
            args(&["--results-dir", &results, "--rater", "jykim"]),
            "q\n".as_bytes(),
            &mut out,
            &no_env,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("resumed 1 score(s)"));
        assert!(text.contains("score: 4 (saved)"));
    }

    #[test]
    fn missing_sources_surface_guidance() {
        let temp = tempdir().unwrap();
        let results = temp.path().to_string_lossy().to_string();
        let mut out = Vec::new();
        let err = run_labeling_session_with_env(
            args(&["--results-dir", &results]),
            "".as_bytes(),
            &mut out,
            &no_env,
        )
        .unwrap_err();
        assert!(err.to_string().contains("upload a JSON-lines file"));
    }

    #[test]
    fn inspect_reports_unresolved_without_mapping() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("direct.jsonl");
        fs::write(&file, "{\"video\": \"c.mp4\"}\nbroken\n").unwrap();
        let missing_dir = temp.path().join("none").to_string_lossy().to_string();
        let file_arg = file.to_string_lossy().to_string();
        let mut out = Vec::new();
        run_inspect_source_with_env(
            args(&["--results-dir", &missing_dir, "--source-file", &file_arg]),
            &mut out,
            &no_env,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("source: direct.jsonl (1 record(s), 1 line(s) skipped)"));
        assert!(text.contains("video unavailable: no mapping table loaded"));
        assert!(text.contains("resolved 0/1 video(s)"));
    }
}
