//! Shogi primitives commonly used within [`crate::shogi`].

use std::fmt::{self, Write};
use std::mem;

use anyhow::bail;

/// Number of files (and ranks) of the shogi board.
pub const BOARD_WIDTH: u8 = 9;
/// Number of squares of the shogi board.
pub const BOARD_SIZE: u8 = BOARD_WIDTH * BOARD_WIDTH;

/// Offset between the discriminant of a piece kind and its promoted
/// counterpart: `Tokin as u8 == Pawn as u8 + PROMOTION_OFFSET`.
const PROMOTION_OFFSET: u8 = 8;

/// A game of shogi is played between two players: the first player (先手,
/// "Black", having the advantage of the first move) and the second player
/// (後手, "White").
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Player {
    Black,
    White,
}

impl Player {
    /// "Flips" the side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Black => "先手",
            Self::White => "後手",
        })
    }
}

/// Shogi piece kinds, both the eight base kinds and the six promoted ones.
///
/// The discriminant of a promoted kind is its base kind plus
/// `PROMOTION_OFFSET`, mirroring the traditional numeric piece encoding.
/// Gold and king have no promoted form.
///
/// ```
/// use kifu::shogi::core::PieceKind;
///
/// assert_eq!(PieceKind::Tokin as u8, PieceKind::Pawn as u8 + 8);
/// assert_eq!(PieceKind::Dragon as u8, PieceKind::Rook as u8 + 8);
/// ```
#[repr(u8)]
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumIter)]
pub enum PieceKind {
    Pawn = 0,
    Lance = 1,
    Knight = 2,
    Silver = 3,
    Gold = 4,
    Bishop = 5,
    Rook = 6,
    King = 7,
    Tokin = 8,
    PromotedLance = 9,
    PromotedKnight = 10,
    PromotedSilver = 11,
    Horse = 13,
    Dragon = 14,
}

impl PieceKind {
    /// Whether this kind is a promoted one.
    #[must_use]
    pub const fn is_promoted(self) -> bool {
        self as u8 >= PROMOTION_OFFSET
    }

    /// Promoted counterpart of this kind.
    ///
    /// Gold, king and the already-promoted kinds have no promoted form and
    /// are returned unchanged; the notation parser never asks for them
    /// (trusted input).
    #[must_use]
    pub const fn promoted(self) -> Self {
        match self {
            Self::Pawn => Self::Tokin,
            Self::Lance => Self::PromotedLance,
            Self::Knight => Self::PromotedKnight,
            Self::Silver => Self::PromotedSilver,
            Self::Bishop => Self::Horse,
            Self::Rook => Self::Dragon,
            _ => self,
        }
    }

    /// Base counterpart of this kind: the inverse of [`PieceKind::promoted`].
    /// Captured pieces always go to the capturer's hand in this form.
    #[must_use]
    pub const fn unpromoted(self) -> Self {
        match self {
            Self::Tokin => Self::Pawn,
            Self::PromotedLance => Self::Lance,
            Self::PromotedKnight => Self::Knight,
            Self::PromotedSilver => Self::Silver,
            Self::Horse => Self::Bishop,
            Self::Dragon => Self::Rook,
            _ => self,
        }
    }
}

impl TryFrom<char> for PieceKind {
    type Error = anyhow::Error;

    /// Decodes a KIF piece glyph. Both 玉/王 are accepted for the king and
    /// both 竜/龍 for the promoted rook.
    fn try_from(glyph: char) -> anyhow::Result<Self> {
        match glyph {
            '歩' => Ok(Self::Pawn),
            '香' => Ok(Self::Lance),
            '桂' => Ok(Self::Knight),
            '銀' => Ok(Self::Silver),
            '金' => Ok(Self::Gold),
            '角' => Ok(Self::Bishop),
            '飛' => Ok(Self::Rook),
            '玉' | '王' => Ok(Self::King),
            'と' => Ok(Self::Tokin),
            '杏' => Ok(Self::PromotedLance),
            '圭' => Ok(Self::PromotedKnight),
            '全' => Ok(Self::PromotedSilver),
            '馬' => Ok(Self::Horse),
            '竜' | '龍' => Ok(Self::Dragon),
            _ => bail!("unknown piece glyph '{glyph}'"),
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(match self {
            Self::Pawn => '歩',
            Self::Lance => '香',
            Self::Knight => '桂',
            Self::Silver => '銀',
            Self::Gold => '金',
            Self::Bishop => '角',
            Self::Rook => '飛',
            Self::King => '玉',
            Self::Tokin => 'と',
            Self::PromotedLance => '杏',
            Self::PromotedKnight => '圭',
            Self::PromotedSilver => '全',
            Self::Horse => '馬',
            Self::Dragon => '竜',
        })
    }
}

/// A specific piece owned by a player. Promotion state is carried by the
/// kind, so the flag and the kind can never disagree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Piece {
    #[allow(missing_docs)]
    pub owner: Player,
    #[allow(missing_docs)]
    pub kind: PieceKind,
}

impl Piece {
    #[allow(missing_docs)]
    #[must_use]
    pub const fn new(owner: Player, kind: PieceKind) -> Self {
        Self { owner, kind }
    }

    /// Whether the piece is promoted.
    #[must_use]
    pub const fn is_promoted(self) -> bool {
        self.kind.is_promoted()
    }

    /// Upgrades the piece to its promoted kind in place. Calling this on an
    /// already-promoted piece is a caller contract violation (it is a no-op
    /// here, unlike the invalid rank it would produce in the raw numeric
    /// encoding).
    pub fn promote(&mut self) {
        self.kind = self.kind.promoted();
    }
}

impl fmt::Display for Piece {
    /// Two-character board cell: a side marker (`v` for the second player)
    /// followed by the piece glyph.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(match self.owner {
            Player::Black => ' ',
            Player::White => 'v',
        })?;
        write!(f, "{}", self.kind)
    }
}

/// Represents a column of the shogi board. Files are numbered 1..=9 from the
/// right (the first player's perspective), per shogi convention, and are
/// written with full-width digits in KIF.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumIter)]
#[allow(missing_docs)]
pub enum File {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
}

const FILE_DIGITS: [char; 9] = ['１', '２', '３', '４', '５', '６', '７', '８', '９'];

impl TryFrom<u8> for File {
    type Error = anyhow::Error;

    fn try_from(file: u8) -> anyhow::Result<Self> {
        match file {
            1..=BOARD_WIDTH => Ok(unsafe { mem::transmute::<u8, Self>(file) }),
            _ => bail!("file should be within 1..=9, got {file}"),
        }
    }
}

impl TryFrom<char> for File {
    type Error = anyhow::Error;

    /// Accepts both ASCII and full-width digits.
    fn try_from(file: char) -> anyhow::Result<Self> {
        match file {
            '1'..='9' => Self::try_from(file as u8 - b'0'),
            '１'..='９' => Self::try_from((file as u32 - '０' as u32) as u8),
            _ => bail!("file should be a digit within 1..=9, got '{file}'"),
        }
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(FILE_DIGITS[*self as usize - 1])
    }
}

/// Represents a row of the shogi board. Ranks are numbered 1..=9 from the
/// second player's side and are written with kanji numerals in KIF.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumIter)]
#[allow(missing_docs)]
pub enum Rank {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
}

const RANK_KANJI: [char; 9] = ['一', '二', '三', '四', '五', '六', '七', '八', '九'];

impl TryFrom<u8> for Rank {
    type Error = anyhow::Error;

    fn try_from(rank: u8) -> anyhow::Result<Self> {
        match rank {
            1..=BOARD_WIDTH => Ok(unsafe { mem::transmute::<u8, Self>(rank) }),
            _ => bail!("rank should be within 1..=9, got {rank}"),
        }
    }
}

impl TryFrom<char> for Rank {
    type Error = anyhow::Error;

    /// Decodes a kanji numeral rank label (一..九).
    fn try_from(rank: char) -> anyhow::Result<Self> {
        match RANK_KANJI.iter().position(|kanji| *kanji == rank) {
            Some(index) => Self::try_from(index as u8 + 1),
            None => bail!("rank should be a kanji numeral within 一..=九, got '{rank}'"),
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(RANK_KANJI[*self as usize - 1])
    }
}

/// A square of the 9×9 board.
///
/// A move played from a player's hand has no square of origin; that case is
/// represented by `Option<Square>` at the move level, never by a sentinel
/// square value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Square {
    file: File,
    rank: Rank,
}

impl Square {
    /// Connects file (column) and rank (row) to form a full square.
    #[must_use]
    pub const fn new(file: File, rank: Rank) -> Self {
        Self { file, rank }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn file(self) -> File {
        self.file
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn rank(self) -> Rank {
        self.rank
    }

    /// Dense 0..81 index into a row-major grid. File 9 comes first within a
    /// row (files are numbered right to left):
    ///
    /// ```
    /// use kifu::shogi::core::{File, Rank, Square};
    ///
    /// assert_eq!(Square::new(File::Nine, Rank::One).index(), 0);
    /// assert_eq!(Square::new(File::One, Rank::Nine).index(), 80);
    /// ```
    #[must_use]
    pub const fn index(self) -> usize {
        (BOARD_WIDTH - self.file as u8) as usize
            + (self.rank as u8 - 1) as usize * BOARD_WIDTH as usize
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file, self.rank)
    }
}
