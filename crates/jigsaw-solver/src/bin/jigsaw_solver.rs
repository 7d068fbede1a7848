use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use jigsaw_assembly::synthetic::{generate, SyntheticParams};
use jigsaw_solver::{assemble_file, dump_pieces, locate_files, SolveError, SolverConfig};
use log::{error, info, warn, LevelFilter};

/// Exit status when the input was fine but no solution was found.
const NOT_SOLVED: u8 = 2;

#[derive(Parser)]
#[command(
    name = "jigsaw-solver",
    version,
    about = "Assemble jigsaw puzzles from photos and locate single pieces"
)]
struct Cli {
    /// JSON config; missing fields keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Debug-level logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Warnings and errors only.
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconstruct the puzzle from a photo of its scattered pieces.
    Assemble {
        scene: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Write an annotated image of every piece into this directory.
        #[arg(long)]
        dump_pieces: Option<PathBuf>,
    },
    /// Find a photographed piece inside a picture of the finished puzzle.
    Locate {
        template: PathBuf,
        scene: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Also write template and scene side by side with the matches.
        #[arg(long)]
        matches: Option<PathBuf>,
    },
    /// Render a synthetic scene of scattered pieces.
    Generate(GenerateArgs),
    /// Write the effective configuration as JSON.
    Config {
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(short, long)]
    output: PathBuf,
    #[arg(long, default_value_t = 3)]
    rows: u32,
    #[arg(long, default_value_t = 3)]
    cols: u32,
    /// Piece side in pixels.
    #[arg(long, default_value_t = 160)]
    side: u32,
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Turn every piece by a random quarter turn.
    #[arg(long)]
    rotate: bool,
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else if cli.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    #[cfg(feature = "tracing")]
    {
        let _ = level;
        jigsaw_core::init_tracing(false);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = jigsaw_core::init_with_level(level);
    }
}

fn run(cli: Cli) -> Result<ExitCode, SolveError> {
    let config = match &cli.config {
        Some(path) => SolverConfig::load_json(path)?,
        None => SolverConfig::default(),
    };

    match cli.command {
        Command::Assemble {
            scene,
            output,
            dump_pieces: dump_dir,
        } => {
            let assembly = assemble_file(&scene, &config)?;
            for issue in &assembly.issues {
                warn!("{issue}");
            }
            if let Some(dir) = dump_dir {
                let n = dump_pieces(&assembly, &dir)?;
                info!("wrote {n} piece images to {}", dir.display());
            }
            match &assembly.canvas {
                Some(canvas) => {
                    canvas.save(&output)?;
                    println!(
                        "{} pieces, {} connections -> {}",
                        assembly.puzzle.len(),
                        assembly.matching.pairs.len(),
                        output.display()
                    );
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    error!("no layout could be reconstructed");
                    Ok(ExitCode::from(NOT_SOLVED))
                }
            }
        }
        Command::Locate {
            template,
            scene,
            output,
            matches,
        } => {
            let found = match locate_files(&template, &scene, &config) {
                Ok(found) => found,
                Err(SolveError::Locate(e)) => {
                    error!("not found: {e}");
                    return Ok(ExitCode::from(NOT_SOLVED));
                }
                Err(e) => return Err(e),
            };
            found.annotated.save(&output)?;
            if let Some(path) = matches {
                let template = image::open(&template)?.to_rgb8();
                let scene = image::open(&scene)?.to_rgb8();
                jigsaw_locate::render_matches(&template, &scene, &found, &config.locate.outline)
                    .save(path)?;
            }
            let c = found.corners;
            println!(
                "found: ({:.1}, {:.1}) ({:.1}, {:.1}) ({:.1}, {:.1}) ({:.1}, {:.1}), {} inliers",
                c[0].x,
                c[0].y,
                c[1].x,
                c[1].y,
                c[2].x,
                c[2].y,
                c[3].x,
                c[3].y,
                found.num_inliers()
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Generate(args) => {
            let puzzle = generate(&SyntheticParams {
                rows: args.rows,
                cols: args.cols,
                side: args.side,
                rotate_pieces: args.rotate,
                seed: args.seed,
                ..SyntheticParams::default()
            });
            puzzle.scene.save(&args.output)?;
            println!(
                "{}x{} puzzle, {} pieces -> {}",
                args.rows,
                args.cols,
                puzzle.pieces.len(),
                args.output.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Config { output } => {
            config.write_json(&output)?;
            println!("config -> {}", output.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
