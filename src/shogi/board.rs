//! Piece placement and in-place position mutation.
//!
//! A [`Board`] is always owned by exactly one replay: replaying a record
//! clones the initial snapshot and advances the clone, so querying different
//! plies or branches never aliases mutable state.

use std::fmt::{self, Write};

use crate::shogi::core::{Piece, PieceKind, Player, Square, BOARD_SIZE, BOARD_WIDTH};
use crate::shogi::record::Move;

/// Hand-rendering order, most valuable kind first.
const HAND_ORDER: [PieceKind; 7] = [
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Gold,
    PieceKind::Silver,
    PieceKind::Knight,
    PieceKind::Lance,
    PieceKind::Pawn,
];

/// A player's hand: captured pieces available to drop, stored as one counter
/// per base kind (a captured king ends the game and is never banked).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hand([u8; 7]);

impl Hand {
    /// Number of pieces of the given kind held. Promoted kinds are looked up
    /// at their base kind: hands only ever hold unpromoted pieces.
    #[must_use]
    pub fn count(&self, kind: PieceKind) -> u8 {
        self.0[Self::slot(kind)]
    }

    pub(crate) fn add(&mut self, kind: PieceKind) {
        self.0[Self::slot(kind)] += 1;
    }

    pub(crate) fn remove(&mut self, kind: PieceKind) {
        // Trusted input: the transcript never drops from an empty hand.
        debug_assert!(self.0[Self::slot(kind)] > 0, "drop from an empty hand");
        self.0[Self::slot(kind)] -= 1;
    }

    fn slot(kind: PieceKind) -> usize {
        debug_assert!(kind != PieceKind::King, "a king can not be held in hand");
        kind.unpromoted() as usize
    }

    #[must_use]
    fn is_empty(&self) -> bool {
        self.0.iter().all(|count| *count == 0)
    }
}

impl fmt::Display for Hand {
    /// Held kinds from the most valuable down, with a count suffix only when
    /// more than one piece of a kind is held (e.g. `飛金歩3`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for kind in HAND_ORDER {
            let count = self.count(kind);
            if count >= 1 {
                write!(f, "{kind}")?;
            }
            if count > 1 {
                write!(f, "{count}")?;
            }
        }
        Ok(())
    }
}

/// Full state of a shogi position: the 9×9 grid plus both hands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    squares: [Option<Piece>; BOARD_SIZE as usize],
    hands: [Hand; 2],
}

impl Board {
    /// Creates a board with no pieces on it and empty hands, to be filled by
    /// the parser from a board-diagram section.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            squares: [None; BOARD_SIZE as usize],
            hands: [Hand::default(); 2],
        }
    }

    /// Creates the starting position of standard (even) shogi.
    #[must_use]
    pub fn starting() -> Self {
        const BACK_RANK: [PieceKind; 9] = [
            PieceKind::Lance,
            PieceKind::Knight,
            PieceKind::Silver,
            PieceKind::Gold,
            PieceKind::King,
            PieceKind::Gold,
            PieceKind::Silver,
            PieceKind::Knight,
            PieceKind::Lance,
        ];
        let mut board = Self::empty();
        for (cell, kind) in BACK_RANK.iter().enumerate() {
            board.squares[cell] = Some(Piece::new(Player::White, *kind));
            board.squares[72 + cell] = Some(Piece::new(Player::Black, *kind));
        }
        board.squares[10] = Some(Piece::new(Player::White, PieceKind::Rook));
        board.squares[16] = Some(Piece::new(Player::White, PieceKind::Bishop));
        board.squares[64] = Some(Piece::new(Player::Black, PieceKind::Bishop));
        board.squares[70] = Some(Piece::new(Player::Black, PieceKind::Rook));
        for cell in 0..BOARD_WIDTH as usize {
            board.squares[18 + cell] = Some(Piece::new(Player::White, PieceKind::Pawn));
            board.squares[54 + cell] = Some(Piece::new(Player::Black, PieceKind::Pawn));
        }
        board
    }

    /// Piece standing on the given square, if any.
    #[must_use]
    pub fn at(&self, square: Square) -> Option<Piece> {
        self.squares[square.index()]
    }

    /// The given player's hand.
    #[must_use]
    pub fn hand(&self, player: Player) -> &Hand {
        &self.hands[player as usize]
    }

    pub(crate) fn put(&mut self, square: Square, piece: Piece) {
        self.squares[square.index()] = Some(piece);
    }

    pub(crate) fn hand_mut(&mut self, player: Player) -> &mut Hand {
        &mut self.hands[player as usize]
    }

    /// Plays one ply, mutating the position in place.
    ///
    /// A drop places the piece and removes it from the mover's hand. A board
    /// move clears the origin, banks a captured opposing piece in its
    /// unpromoted form, places the resulting piece and promotes it in place
    /// when the move says so. The move is trusted (no legality checking), so
    /// this can not fail.
    pub fn apply(&mut self, m: &Move) {
        match m.from {
            None => {
                self.squares[m.to.index()] = Some(m.piece);
                self.hands[m.player as usize].remove(m.piece.kind);
            },
            Some(from) => {
                self.squares[from.index()] = None;
                if let Some(captured) = self.squares[m.to.index()] {
                    if captured.owner != m.player {
                        self.hands[m.player as usize].add(captured.kind.unpromoted());
                    }
                }
                self.squares[m.to.index()] = Some(m.piece);
                if m.promotes {
                    if let Some(piece) = &mut self.squares[m.to.index()] {
                        piece.promote();
                    }
                }
            },
        }
    }

    /// Renders the grid as 9 rows of 9 two-character cells, the second
    /// player's back rank on top (board-diagram orientation).
    #[must_use]
    pub fn render_grid(&self) -> String {
        let mut s = String::with_capacity(BOARD_SIZE as usize * 4);
        for rank in 0..BOARD_WIDTH as usize {
            for file in 0..BOARD_WIDTH as usize {
                match &self.squares[rank * BOARD_WIDTH as usize + file] {
                    Some(piece) => {
                        let _ = write!(s, "{piece}");
                    },
                    None => s.push_str(" ・"),
                }
            }
            if rank as u8 != BOARD_WIDTH - 1 {
                s.push('\n');
            }
        }
        s
    }

    /// Renders one side's hand as a reserve summary line.
    #[must_use]
    pub fn render_hand(&self, player: Player) -> String {
        let hand = self.hand(player);
        if hand.is_empty() {
            return String::from("なし");
        }
        hand.to_string()
    }
}

impl fmt::Display for Board {
    /// Diagnostic rendering: the second player's hand, the grid, the first
    /// player's hand.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "持ち駒:{}", self.render_hand(Player::White))?;
        writeln!(f, "{}", self.render_grid())?;
        write!(f, "持ち駒:{}", self.render_hand(Player::Black))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::shogi::core::{File, Rank};

    fn square(file: u8, rank: u8) -> Square {
        Square::new(File::try_from(file).unwrap(), Rank::try_from(rank).unwrap())
    }

    #[test]
    fn starting_position_layout() {
        let board = Board::starting();
        assert_eq!(
            board.render_grid(),
            "v香v桂v銀v金v玉v金v銀v桂v香\n\
             \u{20}・v飛 ・ ・ ・ ・ ・v角 ・\n\
             v歩v歩v歩v歩v歩v歩v歩v歩v歩\n\
             \u{20}・ ・ ・ ・ ・ ・ ・ ・ ・\n\
             \u{20}・ ・ ・ ・ ・ ・ ・ ・ ・\n\
             \u{20}・ ・ ・ ・ ・ ・ ・ ・ ・\n\
             \u{20}歩 歩 歩 歩 歩 歩 歩 歩 歩\n\
             \u{20}・ 角 ・ ・ ・ ・ ・ 飛 ・\n\
             \u{20}香 桂 銀 金 玉 金 銀 桂 香"
        );
        assert_eq!(board.render_hand(Player::Black), "なし");
        assert_eq!(board.render_hand(Player::White), "なし");
    }

    #[test]
    fn drop_from_hand() {
        let mut board = Board::starting();
        board.hand_mut(Player::Black).add(PieceKind::Pawn);
        board.hand_mut(Player::Black).add(PieceKind::Pawn);
        let drop = Move::new(
            Player::Black,
            Piece::new(Player::Black, PieceKind::Pawn),
            None,
            square(4, 5),
            false,
        );
        board.apply(&drop);
        assert_eq!(
            board.at(square(4, 5)),
            Some(Piece::new(Player::Black, PieceKind::Pawn))
        );
        assert_eq!(board.hand(Player::Black).count(PieceKind::Pawn), 1);
    }

    #[test]
    fn capture_banks_unpromoted_kind() {
        let mut board = Board::empty();
        // A promoted pawn goes back to the opponent's hand as a plain pawn.
        board.put(square(5, 5), Piece::new(Player::White, PieceKind::Tokin));
        board.put(square(5, 9), Piece::new(Player::Black, PieceKind::Rook));
        let capture = Move::new(
            Player::Black,
            Piece::new(Player::Black, PieceKind::Rook),
            Some(square(5, 9)),
            square(5, 5),
            false,
        );
        board.apply(&capture);
        assert_eq!(board.hand(Player::Black).count(PieceKind::Pawn), 1);
        assert_eq!(board.hand(Player::Black).count(PieceKind::Tokin), 1);
        assert_eq!(board.at(square(5, 9)), None);
        assert_eq!(
            board.at(square(5, 5)),
            Some(Piece::new(Player::Black, PieceKind::Rook))
        );
    }

    #[test]
    fn own_piece_on_destination_is_not_banked() {
        // The transcript is trusted, but a destination already holding the
        // mover's own piece must not grow the mover's hand.
        let mut board = Board::empty();
        board.put(square(8, 8), Piece::new(Player::Black, PieceKind::Bishop));
        board.put(square(2, 2), Piece::new(Player::Black, PieceKind::Silver));
        let m = Move::new(
            Player::Black,
            Piece::new(Player::Black, PieceKind::Bishop),
            Some(square(8, 8)),
            square(2, 2),
            false,
        );
        board.apply(&m);
        assert_eq!(board.hand(Player::Black).count(PieceKind::Silver), 0);
    }

    #[test]
    fn promotion_on_apply() {
        let mut board = Board::starting();
        let m = Move::new(
            Player::Black,
            Piece::new(Player::Black, PieceKind::Bishop),
            Some(square(8, 8)),
            square(2, 2),
            true,
        );
        board.apply(&m);
        let piece = board.at(square(2, 2)).unwrap();
        assert_eq!(piece.kind, PieceKind::Horse);
        assert!(piece.is_promoted());
        assert_eq!(board.at(square(8, 8)), None);
        // The white bishop that stood on ２二 is banked unpromoted.
        assert_eq!(board.hand(Player::Black).count(PieceKind::Bishop), 1);
    }

    #[test]
    fn hand_rendering_order_and_counts() {
        let mut board = Board::empty();
        for _ in 0..3 {
            board.hand_mut(Player::Black).add(PieceKind::Pawn);
        }
        board.hand_mut(Player::Black).add(PieceKind::Rook);
        board.hand_mut(Player::Black).add(PieceKind::Gold);
        assert_eq!(board.render_hand(Player::Black), "飛金歩3");
    }
}
