//! Blockfall: classic falling-block puzzle on a 31x19 board, in the terminal.

mod app;
mod board;
mod figure;
mod game;
mod highscores;
mod input;
mod scoring;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use figure::PieceKind;
use game::SessionConfig;
use scoring::PointTable;
use theme::ColorTable;

/// Options derived from CLI that affect the front end (frame rate, title screen).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub frame_rate: f64,
    pub no_menu: bool,
    pub show_panel: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let mut colors = ColorTable::from_theme(&theme);
    for raw in &args.color {
        let (kind, color) = theme::parse_color_override(raw)?;
        colors.set(kind.color_index(), color, theme::hex_name(color));
    }
    let session = SessionConfig {
        points: PointTable {
            per_move: args.points_move,
            per_line: args.points_line,
            per_block: args.points_block,
        },
        speed: args.speed,
        top_points: highscores::load_top_points(),
        seed: args.seed,
        forced_kind: args.piece.map(PieceArg::kind),
        colors,
    };
    let config = GameConfig {
        frame_rate: args.frame_rate,
        no_menu: args.no_menu,
        show_panel: args.panel,
    };
    let mut app = App::new(config, session, theme);
    app.run()?;
    Ok(())
}

/// Classic falling-block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockfall",
    version,
    about = "Classic falling-block puzzle on a 31x19 board. Complete rows to clear them; the game ends when a new piece has no room.",
    long_about = "Blockfall is a terminal falling-block puzzle.\n\n\
        Seven tetrominoes fall onto a 31-row, 19-column board. Complete a row to clear it; \
        everything above drops by one. The game ends when a new piece cannot spawn.\n\n\
        CONTROLS:\n  Left/Right h/l  Move     Up/k        Rotate     Down/j    Soft drop\n  \
        Space/Enter     Hard drop / start        P           Pause      N         New game\n  \
        + / -           Speed    C           Recolour piece type    T         Force next type\n  \
        Tab             Preferences panel        Q / Esc     Quit\n\n\
        Points: every row a piece falls, every locked piece and every cleared row score."
)]
pub struct Args {
    /// Starting fall speed (1 = slowest, 10 = fastest). Speed also rises with score.
    #[arg(short, long, default_value = "1", value_name = "N", value_parser = clap::value_parser!(u32).range(1..=10))]
    pub speed: u32,

    /// Seed for the piece generator (same seed, same piece sequence).
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Spawn only this piece type (debug / practice).
    #[arg(long, value_name = "TYPE")]
    pub piece: Option<PieceArg>,

    /// Override a piece colour, e.g. --color T=#AA00FF. Repeatable.
    #[arg(long, value_name = "KIND=#RRGGBB")]
    pub color: Vec<String>,

    /// Points for each row a piece moves down.
    #[arg(long, default_value = "1", value_name = "N")]
    pub points_move: u32,

    /// Points for each cleared row.
    #[arg(long, default_value = "100", value_name = "N")]
    pub points_line: u32,

    /// Points for each locked piece.
    #[arg(long, default_value = "10", value_name = "N")]
    pub points_block: u32,

    /// Path to theme file (btop-style theme[key]=\"value\"; piece_o .. piece_t set piece colours).
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Skip the title screen and start playing immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Open the preferences panel at start.
    #[arg(long)]
    pub panel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PieceArg {
    O,
    I,
    L,
    J,
    Z,
    S,
    T,
}

impl PieceArg {
    fn kind(self) -> PieceKind {
        match self {
            Self::O => PieceKind::O,
            Self::I => PieceKind::I,
            Self::L => PieceKind::L,
            Self::J => PieceKind::J,
            Self::Z => PieceKind::Z,
            Self::S => PieceKind::S,
            Self::T => PieceKind::T,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let args = Args::try_parse_from(["blockfall"]).unwrap();
        assert_eq!(args.speed, 1);
        assert_eq!(args.points_line, 100);
        assert_eq!(args.palette, Palette::Normal);
        assert!(args.piece.is_none());
    }

    #[test]
    fn test_cli_piece_and_colors() {
        let args = Args::try_parse_from([
            "blockfall", "--piece", "t", "--color", "T=#AA00FF", "--color", "o=#FFF", "-s", "4",
        ])
        .unwrap();
        assert_eq!(args.piece.map(PieceArg::kind), Some(PieceKind::T));
        assert_eq!(args.color.len(), 2);
        assert_eq!(args.speed, 4);
    }

    #[test]
    fn test_cli_rejects_speed_out_of_range() {
        assert!(Args::try_parse_from(["blockfall", "--speed", "11"]).is_err());
        assert!(Args::try_parse_from(["blockfall", "--speed", "0"]).is_err());
    }

    #[test]
    fn test_cli_debug_assert() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
