//! KIF notation parser and the [`Kif`] record facade.
//!
//! A transcript is an ordered sequence of UTF-8 lines:
//!
//! ```text
//! Transcript  ::= Header* Setup? MoveTable
//! Setup       ::= 後手の持駒 line, board diagram rows, 先手の持駒 line
//! MoveTable   ::= 手数----指手 header, then move/annotation/variation lines
//! MoveLine    ::= <ply> <token> [<elapsed time>]
//! Token       ::= Destination Piece 成? (打 | '(' file rank ')')
//! Destination ::= <full-width file digit> <kanji rank numeral> | 同
//! ```
//!
//! Annotation lines start with `*` and attach to the move created last.
//! `変化：N手` lines reset the insertion point so that the following moves
//! form an alternative line replacing the main line from ply N onward.
//! Terminal tokens (投了, 中断, 詰み) end a line of play without error.
//!
//! The transcript is trusted: structure violations and unknown glyphs are
//! fatal, but the legality of the recorded moves is never checked.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use itertools::Itertools;

use crate::shogi::board::Board;
use crate::shogi::core::{File, Piece, PieceKind, Player, Rank, Square, BOARD_WIDTH};
use crate::shogi::record::{Move, NodeId, Tree};

const MOVE_TABLE_HEADER: &str = "手数----指手";
const WHITE_HAND_MARKER: &str = "後手の持駒";
const BLACK_HAND_MARKER: &str = "先手の持駒";
const VARIATION_MARKER: &str = "変化";
const NO_PIECES_IN_HAND: &str = "なし";
const TERMINAL_TOKENS: [&str; 3] = ["投了", "中断", "詰み"];

/// Parses a complete KIF transcript into a game record.
///
/// One-shot and all-or-nothing: the first malformed line or unknown glyph
/// aborts with an error naming the line, and no partial tree is returned.
pub fn parse(input: &str) -> anyhow::Result<Tree> {
    let mut parser = Parser::new();
    for (number, line) in input.lines().enumerate() {
        parser
            .feed(line)
            .with_context(|| format!("transcript line {}: '{}'", number + 1, line.trim_end()))?;
    }
    Ok(parser.finish())
}

/// A parsed game record bound to its transcript source.
#[derive(Debug)]
pub struct Kif {
    tree: Tree,
}

impl Kif {
    /// Opens and parses a KIF transcript file.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("can not read record at {}", path.as_ref().display()))?;
        Self::try_from(contents.as_str())
    }

    /// The move tree of the record.
    #[must_use]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The position the record starts from.
    #[must_use]
    pub fn initial(&self) -> &Board {
        self.tree.initial()
    }

    /// Replays a recorded line; see [`Tree::replay`].
    #[must_use]
    pub fn replay(&self, branch: usize, ply_limit: Option<usize>) -> Board {
        self.tree.replay(branch, ply_limit)
    }
}

impl TryFrom<&str> for Kif {
    type Error = anyhow::Error;

    fn try_from(input: &str) -> anyhow::Result<Self> {
        Ok(Self { tree: parse(input)? })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Consuming header lines until a setup section or the move table.
    SeekingSetup,
    /// Inside the board-diagram section.
    Setup,
    /// Setup complete; waiting for the move table.
    SeekingMoves,
    /// Consuming move, annotation and variation lines.
    Moves,
}

struct Parser {
    phase: Phase,
    board: Board,
    tree: Option<Tree>,
    /// Node the next move line will be attached to.
    cursor: NodeId,
    /// Node created last, the target for annotation lines.
    last_created: Option<NodeId>,
}

impl Parser {
    fn new() -> Self {
        Self {
            phase: Phase::SeekingSetup,
            // Records without a board diagram start from the standard
            // position.
            board: Board::starting(),
            tree: None,
            cursor: Tree::ROOT,
            last_created: None,
        }
    }

    fn feed(&mut self, line: &str) -> anyhow::Result<()> {
        let line = line.trim_end();
        match self.phase {
            Phase::SeekingSetup => {
                if line.contains(WHITE_HAND_MARKER) {
                    self.board = Board::empty();
                    self.hand_line(line, Player::White)?;
                    self.phase = Phase::Setup;
                    return Ok(());
                }
                let _ = self.maybe_start_moves(line)?;
                Ok(())
            },
            Phase::Setup => {
                if line.contains(BLACK_HAND_MARKER) {
                    self.hand_line(line, Player::Black)?;
                    self.phase = Phase::SeekingMoves;
                } else if line.starts_with('|') {
                    self.grid_line(line)?;
                }
                // Column headers and frame rows carry no state.
                Ok(())
            },
            Phase::SeekingMoves => {
                let _ = self.maybe_start_moves(line)?;
                Ok(())
            },
            Phase::Moves => self.record_line(line),
        }
    }

    /// Consumes the remaining input once the move table ends; a record with
    /// no move table yields a tree with the initial position only.
    fn finish(self) -> Tree {
        match self.tree {
            Some(tree) => tree,
            None => Tree::new(self.board),
        }
    }

    /// The move table begins at its fixed header line; a line numbered 1 also
    /// starts it, for truncated records carrying no header.
    fn maybe_start_moves(&mut self, line: &str) -> anyhow::Result<bool> {
        if line.starts_with(MOVE_TABLE_HEADER) {
            self.start_moves();
            return Ok(true);
        }
        if line.split_whitespace().next() == Some("1") {
            self.start_moves();
            self.record_line(line)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Freezes the initial position: every later query replays on top of a
    /// copy of this snapshot.
    fn start_moves(&mut self) {
        self.tree = Some(Tree::new(self.board.clone()));
        self.phase = Phase::Moves;
    }

    fn tree_mut(&mut self) -> &mut Tree {
        self.tree.as_mut().expect("the move phase implies an initialized tree")
    }

    fn tree_ref(&self) -> &Tree {
        self.tree.as_ref().expect("the move phase implies an initialized tree")
    }

    /// One line of the move table: a numbered move, an annotation, a
    /// variation jump or a line to ignore (e.g. the result summary).
    fn record_line(&mut self, line: &str) -> anyhow::Result<()> {
        if line.is_empty() {
            return Ok(());
        }
        if let Some(text) = line.strip_prefix('*') {
            // Opening commentary preceding the first move has no node to
            // attach to and is dropped.
            if let Some(node) = self.last_created {
                self.tree_mut().annotate(node, text);
            }
            return Ok(());
        }
        if let Some(rest) = line.trim_start().strip_prefix(VARIATION_MARKER) {
            return self.variation_line(rest);
        }
        self.move_line(line)
    }

    /// `変化：N手` resets the insertion point to the main-line node at ply
    /// N−1, making the next move line a sibling alternative of ply N.
    fn variation_line(&mut self, rest: &str) -> anyhow::Result<()> {
        let digits: String = rest.chars().filter(char::is_ascii_digit).collect();
        let ply: usize = digits
            .parse()
            .with_context(|| format!("variation line should name a ply, got '{rest}'"))?;
        if ply == 0 {
            bail!("variation ply numbers start at 1");
        }
        self.cursor = self.tree_ref().mainline_node(ply - 1);
        Ok(())
    }

    fn move_line(&mut self, line: &str) -> anyhow::Result<()> {
        let trimmed = line.trim_start();
        let Some(first) = trimmed.split_whitespace().next() else {
            return Ok(());
        };
        let Ok(ply) = first.parse::<usize>() else {
            // Not a numbered move (e.g. まで〜手で先手の勝ち).
            return Ok(());
        };
        let rest = trimmed[first.len()..].trim_start();
        // The elapsed-time suffix is separated by ASCII whitespace.
        let token = match rest.find([' ', '\t']) {
            Some(end) => &rest[..end],
            None => rest,
        };
        if TERMINAL_TOKENS.iter().any(|terminal| token.starts_with(terminal)) {
            // Ends this line of play; variation sections may still follow.
            return Ok(());
        }
        let player = if ply % 2 == 1 { Player::Black } else { Player::White };
        let previous_to = self.tree_ref().game_move(self.cursor).map(|m| m.to);
        let mv = parse_move_token(token, player, previous_to)?;
        let cursor = self.cursor;
        let node = self.tree_mut().add_child(cursor, mv)?;
        self.cursor = node;
        self.last_created = Some(node);
        Ok(())
    }

    /// A reserve line: `<side>の持駒：` followed by whitespace-separated
    /// `<piece glyph><kansuji count>` entries, or なし for an empty hand.
    fn hand_line(&mut self, line: &str, player: Player) -> anyhow::Result<()> {
        let Some((_, contents)) = line.split_once('：') else {
            bail!("reserve line should contain '：', got '{line}'");
        };
        let contents = contents.trim();
        if contents.is_empty() || contents == NO_PIECES_IN_HAND {
            return Ok(());
        }
        for entry in contents.split_whitespace() {
            let mut chars = entry.chars();
            let glyph = chars.next().expect("split_whitespace never yields empty entries");
            let kind = PieceKind::try_from(glyph)?;
            let count = match chars.as_str() {
                "" => 1,
                numerals => kansuji_number(numerals)?,
            };
            for _ in 0..count {
                self.board.hand_mut(player).add(kind);
            }
        }
        Ok(())
    }

    /// A board-diagram row: `|` frame, 9 two-character cells from file 9 down
    /// to file 1 (side marker `v` for the second player, ・ for an empty
    /// square), then the rank's kanji numeral label.
    fn grid_line(&mut self, line: &str) -> anyhow::Result<()> {
        let rank_label = line.chars().last().expect("grid lines are non-empty");
        let rank = Rank::try_from(rank_label)?;
        let Some(cells) = line.strip_prefix('|').and_then(|rest| rest.split('|').next()) else {
            bail!("board row should be framed by '|', got '{line}'");
        };
        let cells: Vec<char> = cells.chars().collect();
        if cells.len() != 2 * BOARD_WIDTH as usize {
            bail!("board row should hold 9 two-character cells, got '{line}'");
        }
        for (cell, pair) in cells.chunks(2).enumerate() {
            let (marker, glyph) = (pair[0], pair[1]);
            if glyph == '・' {
                continue;
            }
            let owner = if marker == 'v' { Player::White } else { Player::Black };
            let file = File::try_from(BOARD_WIDTH - cell as u8)?;
            self.board
                .put(Square::new(file, rank), Piece::new(owner, PieceKind::try_from(glyph)?));
        }
        Ok(())
    }
}

/// Decomposes one move token, e.g. `７六歩(77)`, `８八角成(22)`, `４五桂打`,
/// `同　飛(82)` or `成銀(31)` forms.
fn parse_move_token(token: &str, player: Player, previous_to: Option<Square>) -> anyhow::Result<Move> {
    let mut chars = token.chars().peekable();
    let to = if chars.peek() == Some(&'同') {
        let _ = chars.next();
        while chars.peek().is_some_and(|ch| ch.is_whitespace()) {
            let _ = chars.next();
        }
        previous_to.with_context(|| format!("同 requires a preceding move: '{token}'"))?
    } else {
        let file = File::try_from(
            chars
                .next()
                .with_context(|| format!("move token '{token}' is missing a destination"))?,
        )?;
        let rank = Rank::try_from(
            chars
                .next()
                .with_context(|| format!("move token '{token}' is missing a destination rank"))?,
        )?;
        Square::new(file, rank)
    };
    let kind = match chars.next() {
        // 成銀/成桂/成香: an already-promoted piece on the move.
        Some('成') => {
            let base = PieceKind::try_from(
                chars
                    .next()
                    .with_context(|| format!("move token '{token}' is missing a piece glyph"))?,
            )?;
            base.promoted()
        },
        Some(glyph) => PieceKind::try_from(glyph)?,
        None => bail!("move token '{token}' is missing a piece glyph"),
    };
    let mut promotes = false;
    let mut from = None;
    let mut dropped = false;
    while let Some(ch) = chars.next() {
        match ch {
            '成' => promotes = true,
            '打' => dropped = true,
            '(' => {
                let origin: String = chars.by_ref().take_while(|c| *c != ')').collect();
                let Some((file, rank)) = origin.chars().collect_tuple() else {
                    bail!("origin should be two digits, got '{token}'");
                };
                let rank = rank
                    .to_digit(10)
                    .with_context(|| format!("origin rank should be a digit, got '{token}'"))?;
                from = Some(Square::new(File::try_from(file)?, Rank::try_from(rank as u8)?));
            },
            _ => bail!("unexpected character '{ch}' in move token '{token}'"),
        }
    }
    if dropped {
        // A piece dropped from hand is never promoted in the same ply.
        if promotes || kind.is_promoted() {
            bail!("a dropped piece can not be promoted: '{token}'");
        }
        from = None;
    } else if from.is_none() {
        bail!("move token '{token}' has neither an origin square nor a drop marker");
    }
    Ok(Move::new(player, Piece::new(player, kind), from, to, promotes))
}

/// A kanji numeral within 1..=19: a lone units digit, 十 for ten, or 十
/// followed by a units digit (a hand never holds more than 18 of a kind).
fn kansuji_number(text: &str) -> anyhow::Result<u8> {
    let mut chars = text.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('十'), None, None) => Ok(10),
        (Some('十'), Some(units), None) => Ok(10 + kanji_digit(units)?),
        (Some(units), None, None) => kanji_digit(units),
        _ => bail!("kansuji count should be within 一..=十九, got '{text}'"),
    }
}

fn kanji_digit(digit: char) -> anyhow::Result<u8> {
    match "一二三四五六七八九".chars().position(|kanji| kanji == digit) {
        Some(index) => Ok(index as u8 + 1),
        None => bail!("unknown kanji numeral '{digit}'"),
    }
}
