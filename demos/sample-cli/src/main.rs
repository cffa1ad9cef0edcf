use cmdbind::{info, CliError, CliResult, Command, Describe, Registry};
use std::io::{BufRead, BufReader, Read};

// ============================================
// Commands
// ============================================

#[derive(Default, Describe)]
#[command(
    name = "head",
    desc = "Print the first lines of a file",
    category = "Text",
    footer = "Use - as FILE to read standard input."
)]
struct Head {
    #[arg(short = 'n', long = "lines", default = "10", desc = "Number of lines to print")]
    lines: i64,

    #[arg(short = 'q', long = "quiet", desc = "Never print a header")]
    quiet: bool,

    #[arg(positional, name = "FILE", default = "-", desc = "Input file")]
    file: String,
}

impl Command for Head {
    fn exec(&mut self) -> CliResult<()> {
        let lines = usize::try_from(self.lines).map_err(|_| CliError::User(
            cmdbind::UserError::InvalidArgument {
                arg: "--lines".to_string(),
                reason: "must not be negative".to_string(),
            },
        ))?;

        let input: Box<dyn Read> = if self.file == "-" {
            Box::new(std::io::stdin())
        } else {
            Box::new(std::fs::File::open(&self.file)?)
        };

        if !self.quiet {
            println!("==> {} <==", self.file);
        }
        for line in BufReader::new(input).lines().take(lines) {
            println!("{}", line?);
        }
        info!(file = %self.file, lines, "head finished");
        Ok(())
    }
}

#[derive(Default, Describe)]
#[command(name = "sum", desc = "Add integers (decimal or 0x hex)", category = "Math")]
struct Sum {
    #[arg(long = "scale", default = "1.0", desc = "Multiply the total")]
    scale: f64,

    #[arg(positional, name = "NUMBER", required)]
    numbers: Vec<i64>,
}

impl Command for Sum {
    fn exec(&mut self) -> CliResult<()> {
        let total: i64 = self
            .numbers
            .iter()
            .try_fold(0i64, |acc, n| acc.checked_add(*n))
            .ok_or_else(|| anyhow::anyhow!("integer overflow while summing {:?}", self.numbers))?;
        println!("{}", total as f64 * self.scale);
        Ok(())
    }
}

#[derive(Default, Describe)]
#[command(
    name = "env",
    desc = "Print KEY=VALUE assignments",
    category = "Debug",
    experimental
)]
struct Env {
    #[arg(short = 's', long = "set", help_value = "KEY=VALUE", desc = "Assignment (repeatable)")]
    sets: Vec<String>,

    #[arg(long = "sorted", desc = "Sort by key")]
    sorted: bool,
}

impl Command for Env {
    fn exec(&mut self) -> CliResult<()> {
        let mut pairs = Vec::new();
        for set in &self.sets {
            let (key, value) = set.split_once('=').ok_or_else(|| {
                CliError::User(cmdbind::UserError::InvalidArgument {
                    arg: set.clone(),
                    reason: "expected KEY=VALUE".to_string(),
                })
            })?;
            pairs.push((key, value));
        }
        if self.sorted {
            pairs.sort();
        }
        for (key, value) in pairs {
            println!("{key}={value}");
        }
        Ok(())
    }
}

#[derive(Default, Describe)]
#[command(name = "manifest", desc = "Dump command declarations as JSON", hidden)]
struct Manifest {
    json: Option<anyhow::Result<String>>,
}

impl Command for Manifest {
    fn attach(&mut self, registry: &Registry) {
        self.json = Some(registry.manifest_json().map_err(anyhow::Error::from));
    }

    fn exec(&mut self) -> CliResult<()> {
        let json = self
            .json
            .take()
            .ok_or_else(|| CliError::system("manifest requested before attach"))??;
        println!("{json}");
        Ok(())
    }
}

// ============================================
// Main
// ============================================

fn registry() -> Registry {
    Registry::new()
        .prog_name("textkit")
        .help_header("textkit - small text utilities")
        .help_footer("Set RUST_LOG=cmdbind=debug to trace argument binding.")
        .category_order(["Text", "Math", "Debug"])
        .command::<Head>()
        .command::<Sum>()
        .command::<Env>()
        .command::<Manifest>()
}

fn main() {
    cmdbind::init_subscriber();

    let response = registry().run_from_env();
    response.emit();
    std::process::exit(response.exit_code);
}
