//! The game record: one-ply moves and the branching move tree.
//!
//! The tree is arena-backed: nodes live in a flat `Vec` and refer to each
//! other by index, so the parent link is navigation-only bookkeeping and
//! ownership stays strictly parent-to-child.

use std::fmt;

use anyhow::anyhow;
use arrayvec::ArrayVec;

use crate::shogi::board::Board;
use crate::shogi::core::{Piece, Player, Square};

/// An immutable description of one ply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Move {
    /// Side making the move.
    pub player: Player,
    /// The piece as it arrives on the destination square (promotion through
    /// [`Move::promotes`] is applied on top of this by the board).
    pub piece: Piece,
    /// Square of origin; `None` for a drop from the mover's hand.
    pub from: Option<Square>,
    /// Destination square.
    pub to: Square,
    /// Whether the piece promotes on arrival.
    pub promotes: bool,
    /// Free-text commentary attached to this ply in the transcript.
    pub annotation: String,
}

impl Move {
    /// Creates a move with no annotation attached yet.
    #[must_use]
    pub const fn new(
        player: Player,
        piece: Piece,
        from: Option<Square>,
        to: Square,
        promotes: bool,
    ) -> Self {
        Self {
            player,
            piece,
            from,
            to,
            promotes,
            annotation: String::new(),
        }
    }
}

impl fmt::Display for Move {
    /// Serializes a move in KIF style, e.g. `７六歩(77)` or `４五桂打`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.to, self.piece.kind)?;
        if self.promotes {
            write!(f, "成")?;
        }
        match self.from {
            Some(from) => write!(f, "({}{})", from.file() as u8, from.rank() as u8),
            None => write!(f, "打"),
        }
    }
}

/// Index of a node in its [`Tree`]'s arena.
pub type NodeId = usize;

#[derive(Debug)]
struct Node {
    /// `None` only for the root, which precedes the first ply.
    mv: Option<Move>,
    parent: Option<NodeId>,
    /// First child continues the main line; the notation model allows one
    /// recorded alternative per position, so two children at most.
    children: ArrayVec<NodeId, 2>,
}

/// A parsed game record: the initial position snapshot plus the tree of
/// recorded moves. Read-only once parsing completes.
#[derive(Debug)]
pub struct Tree {
    initial: Board,
    nodes: Vec<Node>,
}

impl Tree {
    /// Id of the root node. The root holds no move and its first child is
    /// ply 1 of the main line.
    pub const ROOT: NodeId = 0;

    /// Creates a record with no moves yet.
    #[must_use]
    pub fn new(initial: Board) -> Self {
        Self {
            initial,
            nodes: vec![Node {
                mv: None,
                parent: None,
                children: ArrayVec::new(),
            }],
        }
    }

    /// The position the record starts from.
    #[must_use]
    pub fn initial(&self) -> &Board {
        &self.initial
    }

    /// Children of a node: the main-line continuation first, the recorded
    /// alternative (if any) second.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].children
    }

    /// Parent of a node; `None` for the root.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].parent
    }

    /// The move played at this node; `None` for the root.
    #[must_use]
    pub fn game_move(&self, node: NodeId) -> Option<&Move> {
        self.nodes[node].mv.as_ref()
    }

    /// Node reached by following main-line (first) children the given number
    /// of plies from the root. Stops early at a leaf.
    #[must_use]
    pub fn mainline_node(&self, plies: usize) -> NodeId {
        let mut node = Self::ROOT;
        for _ in 0..plies {
            match self.nodes[node].children.first() {
                Some(child) => node = *child,
                None => break,
            }
        }
        node
    }

    pub(crate) fn add_child(&mut self, parent: NodeId, mv: Move) -> anyhow::Result<NodeId> {
        let id = self.nodes.len();
        self.nodes[parent].children.try_push(id).map_err(|_| {
            anyhow!("a position supports at most two continuations (main line and one variation)")
        })?;
        self.nodes.push(Node {
            mv: Some(mv),
            parent: Some(parent),
            children: ArrayVec::new(),
        });
        Ok(id)
    }

    pub(crate) fn annotate(&mut self, node: NodeId, text: &str) {
        if let Some(mv) = &mut self.nodes[node].mv {
            if !mv.annotation.is_empty() {
                mv.annotation.push('\n');
            }
            mv.annotation.push_str(text);
        }
    }

    /// Replays a line of the record onto a fresh copy of the initial
    /// position and returns the resulting board.
    ///
    /// `branch` selects, at each two-child node encountered in order, whether
    /// to leave the main line: the alternative is taken while fewer than
    /// `branch` alternatives have been taken so far. `branch == 0` follows
    /// the main line end to end; a `branch` larger than the number of branch
    /// points is not an error, the excess is simply unused. This
    /// one-counter selection model is deliberately kept compatible with the
    /// notation's single-alternative variation records; it does not scale to
    /// richer trees.
    ///
    /// `ply_limit` stops the replay after that many plies; `None` (or a
    /// limit beyond the line's length) replays to the end of the line.
    #[must_use]
    pub fn replay(&self, branch: usize, ply_limit: Option<usize>) -> Board {
        let mut board = self.initial.clone();
        let mut node = Self::ROOT;
        let mut plies = 0;
        let mut alternatives_taken = 0;
        loop {
            if ply_limit == Some(plies) {
                break;
            }
            node = match self.nodes[node].children.as_slice() {
                [] => break,
                [next] => *next,
                [main, alternative] => {
                    if alternatives_taken < branch {
                        alternatives_taken += 1;
                        *alternative
                    } else {
                        *main
                    }
                },
                _ => unreachable!("children are capped at two"),
            };
            let mv = self.nodes[node].mv.as_ref().expect("only the root holds no move");
            board.apply(mv);
            plies += 1;
        }
        board
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::shogi::core::{File, PieceKind, Rank};

    fn square(file: u8, rank: u8) -> Square {
        Square::new(File::try_from(file).unwrap(), Rank::try_from(rank).unwrap())
    }

    fn push(player: Player, kind: PieceKind, from: (u8, u8), to: (u8, u8)) -> Move {
        Move::new(
            player,
            Piece::new(player, kind),
            Some(square(from.0, from.1)),
            square(to.0, to.1),
            false,
        )
    }

    /// ７六歩 / ３四歩 / ２六歩 with ８四歩 recorded as an alternative to
    /// ply 2.
    fn opening_with_variation() -> Tree {
        let mut tree = Tree::new(Board::starting());
        let first = tree
            .add_child(Tree::ROOT, push(Player::Black, PieceKind::Pawn, (7, 7), (7, 6)))
            .unwrap();
        let second = tree
            .add_child(first, push(Player::White, PieceKind::Pawn, (3, 3), (3, 4)))
            .unwrap();
        let _ = tree
            .add_child(second, push(Player::Black, PieceKind::Pawn, (2, 7), (2, 6)))
            .unwrap();
        let _ = tree
            .add_child(first, push(Player::White, PieceKind::Pawn, (8, 3), (8, 4)))
            .unwrap();
        tree
    }

    #[test]
    fn replay_mainline_matches_sequential_apply() {
        let tree = opening_with_variation();
        let mut expected = Board::starting();
        expected.apply(&push(Player::Black, PieceKind::Pawn, (7, 7), (7, 6)));
        expected.apply(&push(Player::White, PieceKind::Pawn, (3, 3), (3, 4)));
        expected.apply(&push(Player::Black, PieceKind::Pawn, (2, 7), (2, 6)));
        assert_eq!(tree.replay(0, None), expected);
    }

    #[test]
    fn replay_alternative_diverges_at_branch_point() {
        let tree = opening_with_variation();
        let branched = tree.replay(1, None);
        // Plies before the branch point match the main line.
        assert_eq!(
            tree.replay(1, Some(1)),
            tree.replay(0, Some(1)),
            "lines only diverge from the branch point onward"
        );
        // The alternative replaces ply 2 and ends the line there.
        assert_eq!(
            branched.at(square(8, 4)),
            Some(Piece::new(Player::White, PieceKind::Pawn))
        );
        assert_eq!(branched.at(square(3, 4)), None);
        assert_eq!(branched.at(square(2, 6)), None);
    }

    #[test]
    fn replay_ply_limit() {
        let tree = opening_with_variation();
        let mut expected = Board::starting();
        expected.apply(&push(Player::Black, PieceKind::Pawn, (7, 7), (7, 6)));
        assert_eq!(tree.replay(0, Some(1)), expected);
        // Zero plies reproduces the initial position.
        assert_eq!(&tree.replay(0, Some(0)), tree.initial());
        // A limit beyond the line's depth replays to the end.
        assert_eq!(tree.replay(0, Some(100)), tree.replay(0, None));
    }

    #[test]
    fn excess_branch_choices_are_unused() {
        let tree = opening_with_variation();
        assert_eq!(tree.replay(5, None), tree.replay(1, None));
    }

    #[test]
    fn mainline_node_follows_first_children() {
        let tree = opening_with_variation();
        let first = tree.mainline_node(1);
        assert_eq!(tree.parent(first), Some(Tree::ROOT));
        assert_eq!(tree.game_move(first).unwrap().to, square(7, 6));
        assert_eq!(tree.children(first).len(), 2);
        // Walking past the leaves stops at the last main-line node.
        assert_eq!(tree.mainline_node(3), tree.mainline_node(42));
    }

    #[test]
    fn third_continuation_is_rejected() {
        let mut tree = opening_with_variation();
        let first = tree.mainline_node(1);
        assert!(tree
            .add_child(first, push(Player::White, PieceKind::Pawn, (1, 3), (1, 4)))
            .is_err());
    }

    #[test]
    fn move_display() {
        assert_eq!(
            push(Player::Black, PieceKind::Pawn, (7, 7), (7, 6)).to_string(),
            "７六歩(77)"
        );
        let drop = Move::new(
            Player::Black,
            Piece::new(Player::Black, PieceKind::Knight),
            None,
            square(4, 5),
            false,
        );
        assert_eq!(drop.to_string(), "４五桂打");
        let promotion = Move::new(
            Player::Black,
            Piece::new(Player::Black, PieceKind::Bishop),
            Some(square(8, 8)),
            square(2, 2),
            true,
        );
        assert_eq!(promotion.to_string(), "２二角成(88)");
    }
}
