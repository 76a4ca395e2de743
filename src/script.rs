//! Layout scripts for the CLI host
//!
//! One command per line; `#` starts a comment.
//!
//! ```text
//! push <layer> <class> [priority] [requester]
//! push-async <layer> <soft-path> [priority] [requester] [--no-suspend]
//! pop <layer>
//! toggle <layer> <class> [priority] [requester]
//! theme <name>
//! wait
//! status [--json]
//! ```
//!
//! Layers may be named by full tag or short name (`Modal`). Async pushes land
//! between commands, the way a frame loop would see them; `wait` blocks until
//! every pending load has finished.

use crate::core::{AsyncPushOutcome, AsyncPushResult, LayoutController, ToggleOutcome};
use crate::data::{LayerId, Priority};
use crate::logging::LAYOUT_TARGET;
use crate::theme::ThemePresets;
use anyhow::{anyhow, bail, Context, Result};
use std::io::Write;

const DEFAULT_REQUESTER: &str = "Script";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Push {
        layer: String,
        class: String,
        priority: Priority,
        requester: String,
    },
    PushAsync {
        layer: String,
        soft_path: String,
        priority: Priority,
        requester: String,
        suspend_input: bool,
    },
    Pop {
        layer: String,
    },
    Toggle {
        layer: String,
        class: String,
        priority: Priority,
        requester: String,
    },
    Theme {
        name: String,
    },
    Wait,
    Status {
        json: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub line: usize,
    pub command: Command,
}

/// Parse a whole script. Fails on the first malformed line.
pub fn parse_script(text: &str) -> Result<Vec<ScriptLine>> {
    let mut lines = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        if let Some(command) =
            parse_command(raw).with_context(|| format!("line {}: {}", line, raw.trim()))?
        {
            lines.push(ScriptLine { line, command });
        }
    }
    Ok(lines)
}

/// Parse one line; blank lines and comments yield None
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    };
    let mut words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }

    let flags: Vec<&str> = words.iter().copied().filter(|w| w.starts_with("--")).collect();
    words.retain(|w| !w.starts_with("--"));
    if words.is_empty() {
        bail!("missing command before {}", flags.join(" "));
    }
    let has_flag = |name: &str| flags.contains(&name);

    let verb = words[0].to_ascii_lowercase();
    let args = &words[1..];
    let allowed_flags: &[&str] = match verb.as_str() {
        "push-async" => &["--no-suspend"],
        "status" => &["--json"],
        _ => &[],
    };
    if let Some(flag) = flags.iter().find(|f| !allowed_flags.contains(*f)) {
        bail!("unknown flag '{}' for '{}'", flag, verb);
    }

    let command = match verb.as_str() {
        "push" | "toggle" => {
            let (layer, class, priority, requester) = push_args(&verb, args)?;
            if verb == "push" {
                Command::Push {
                    layer,
                    class,
                    priority,
                    requester,
                }
            } else {
                Command::Toggle {
                    layer,
                    class,
                    priority,
                    requester,
                }
            }
        }
        "push-async" => {
            let (layer, soft_path, priority, requester) = push_args(&verb, args)?;
            Command::PushAsync {
                layer,
                soft_path,
                priority,
                requester,
                suspend_input: !has_flag("--no-suspend"),
            }
        }
        "pop" => match args {
            [layer] => Command::Pop {
                layer: layer.to_string(),
            },
            _ => bail!("usage: pop <layer>"),
        },
        "theme" => match args {
            [name] => Command::Theme {
                name: name.to_string(),
            },
            _ => bail!("usage: theme <name>"),
        },
        "wait" if args.is_empty() => Command::Wait,
        "wait" => bail!("usage: wait"),
        "status" if args.is_empty() => Command::Status {
            json: has_flag("--json"),
        },
        "status" => bail!("usage: status [--json]"),
        other => bail!("unknown command '{}'", other),
    };
    Ok(Some(command))
}

fn push_args(verb: &str, args: &[&str]) -> Result<(String, String, Priority, String)> {
    if args.len() < 2 || args.len() > 4 {
        bail!("usage: {} <layer> <class> [priority] [requester]", verb);
    }
    let priority = match args.get(2) {
        Some(word) => Priority::parse(word).ok_or_else(|| {
            anyhow!(
                "unknown priority '{}' (expected low, normal, high or critical)",
                word
            )
        })?,
        None => Priority::default(),
    };
    let requester = args.get(3).copied().unwrap_or(DEFAULT_REQUESTER);
    Ok((
        args[0].to_string(),
        args[1].to_string(),
        priority,
        requester.to_string(),
    ))
}

/// Outcome of a script run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub commands: usize,
    /// Commands the layout rejected
    pub failures: usize,
    /// Async pushes that ended in failure
    pub failed_loads: usize,
}

/// Runs parsed commands against a layout, writing a transcript to `out`
pub struct ScriptRunner<'a, W: Write> {
    layout: &'a mut LayoutController,
    out: W,
    summary: RunSummary,
}

impl<'a, W: Write> ScriptRunner<'a, W> {
    pub fn new(layout: &'a mut LayoutController, out: W) -> Self {
        Self {
            layout,
            out,
            summary: RunSummary::default(),
        }
    }

    pub async fn run(mut self, script: &[ScriptLine]) -> Result<RunSummary> {
        for line in script {
            self.summary.commands += 1;
            if let Err(e) = self.execute(&line.command).await {
                tracing::warn!(target: LAYOUT_TARGET, "script line {}: {:#}", line.line, e);
                writeln!(self.out, "error (line {}): {:#}", line.line, e)?;
                self.summary.failures += 1;
            }
            self.layout.process_completed_loads();
            self.write_reports()?;
        }
        Ok(self.summary)
    }

    /// Map a script layer name onto a declared layer; unknown names pass
    /// through so the layout reports them
    fn layer(&self, name: &str) -> LayerId {
        self.layout
            .declared_layers()
            .iter()
            .find(|def| def.id.matches_name(name))
            .map(|def| def.id.clone())
            .unwrap_or_else(|| LayerId::new(name))
    }

    async fn execute(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::Push {
                layer,
                class,
                priority,
                requester,
            } => {
                let layer = self.layer(layer);
                let handle = self.layout.push_widget_to_layer(
                    &layer,
                    class.as_str(),
                    *priority,
                    requester.as_str(),
                )?;
                writeln!(self.out, "pushed {} {} onto {}", handle.class(), handle.id(), layer)?;
            }
            Command::PushAsync {
                layer,
                soft_path,
                priority,
                requester,
                suspend_input,
            } => {
                let layer = self.layer(layer);
                let outcome = self.layout.push_widget_to_layer_async(
                    &layer,
                    soft_path.as_str(),
                    *priority,
                    requester.as_str(),
                    *suspend_input,
                )?;
                match outcome {
                    AsyncPushOutcome::Started(id) => {
                        writeln!(self.out, "started {} for {} onto {}", id, soft_path, layer)?
                    }
                    AsyncPushOutcome::Queued => {
                        writeln!(self.out, "queued {} onto {}", soft_path, layer)?
                    }
                    AsyncPushOutcome::Rejected => {
                        writeln!(self.out, "rejected {} onto {}", soft_path, layer)?
                    }
                }
            }
            Command::Pop { layer } => {
                let layer = self.layer(layer);
                if self.layout.pop_widget_from_layer(&layer)? {
                    writeln!(self.out, "popped {}", layer)?;
                } else {
                    writeln!(self.out, "nothing to pop on {}", layer)?;
                }
            }
            Command::Toggle {
                layer,
                class,
                priority,
                requester,
            } => {
                let layer = self.layer(layer);
                match self.layout.toggle_widget_on_layer(
                    &layer,
                    class.as_str(),
                    *priority,
                    requester.as_str(),
                )? {
                    ToggleOutcome::Pushed(handle) => {
                        writeln!(self.out, "toggled on {} {} ({})", handle.class(), handle.id(), layer)?
                    }
                    ToggleOutcome::Popped(handle) => {
                        writeln!(self.out, "toggled off {} {} ({})", handle.class(), handle.id(), layer)?
                    }
                }
            }
            Command::Theme { name } => {
                let theme = ThemePresets::get(name)
                    .ok_or_else(|| anyhow!("unknown theme '{}'", name))?;
                self.layout.set_theme(theme);
                writeln!(self.out, "theme {}", name)?;
            }
            Command::Wait => {
                let finished = self.layout.wait_for_pending_loads().await;
                writeln!(self.out, "waited for {} load(s)", finished)?;
            }
            Command::Status { json } => self.write_status(*json)?,
        }
        Ok(())
    }

    fn write_reports(&mut self) -> Result<()> {
        for report in self.layout.take_async_reports() {
            let result = match &report.result {
                AsyncPushResult::Pushed(id) => format!("pushed {}", id),
                AsyncPushResult::Failed(err) => {
                    self.summary.failed_loads += 1;
                    format!("failed: {}", err)
                }
                AsyncPushResult::Superseded => "superseded".to_string(),
                AsyncPushResult::Discarded => "discarded".to_string(),
                AsyncPushResult::Cancelled => "cancelled".to_string(),
            };
            writeln!(
                self.out,
                "  async {} onto {} ({}): {}",
                report.soft_class, report.layer, report.priority, result
            )?;
        }
        Ok(())
    }

    fn write_status(&mut self, json: bool) -> Result<()> {
        let snapshot = self.layout.snapshot();
        if json {
            let text = serde_json::to_string_pretty(&snapshot)
                .context("Failed to serialize layout snapshot")?;
            writeln!(self.out, "{}", text)?;
            return Ok(());
        }

        writeln!(
            self.out,
            "layout {:?}, input suspensions: {}",
            snapshot.status, snapshot.input_suspensions
        )?;
        for layer in snapshot.layers.iter().rev() {
            let widgets: Vec<String> = layer
                .widgets
                .iter()
                .map(|w| format!("{}{}", w.class, w.id))
                .collect();
            let mut line = format!(
                "  {:<20} {} [{}]",
                layer.id.as_str(),
                if layer.modal { "modal" } else { "     " },
                widgets.join(", ")
            );
            if let Some(pending) = &layer.pending {
                line.push_str(&format!(" loading {} ({})", pending.class, pending.priority));
            }
            if let Some(queued) = &layer.queued {
                line.push_str(&format!(" queued {} ({})", queued.class, queued.priority));
            }
            if layer.input_blocked {
                line.push_str(" (input blocked)");
            }
            writeln!(self.out, "{}", line)?;
        }
        if let Some(focus) = &snapshot.focus_target {
            writeln!(self.out, "  focus: {}", focus.name())?;
        }
        Ok(())
    }
}
