//! The alignment data model: strand-directed intervals, gap-free
//! sub-alignments, and per-query records grouping them with the raw input
//! text they came from.

use std::fmt;

pub(crate) mod flip;
pub(crate) mod reader;
pub(crate) mod shrink;
pub(crate) mod split;

/// Chromosome names treated as topologically circular, exempt from the
/// non-colinearity test.
pub(crate) const CIRCULAR_CHROMS: [&str; 2] = ["chrM", "M"];

/// Name prefixes of unplaced sequences: such names never count as a known
/// chromosome for the inter-chromosome test.
pub(crate) const UNPLACED_PREFIXES: [&str; 2] = ["chrUn", "Un"];

/// The canonical chromosome: the name up to the first underscore, so that
/// alternate-locus names like `chr1_KI270762v1_alt` collapse onto `chr1`.
pub(crate) fn canonical_chrom(name: &str) -> &str {
    match name.split_once('_') {
        Some((prefix, _)) => prefix,
        None => name,
    }
}

pub(crate) fn is_known_chrom(name: &str) -> bool {
    !UNPLACED_PREFIXES.iter().any(|p| name.starts_with(p))
}

pub(crate) fn is_circular_chrom(name: &str) -> bool {
    CIRCULAR_CHROMS.contains(&canonical_chrom(name))
}

/// The strand of one sequence in an alignment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Strand {
    Fwd,
    Rev,
}

impl Strand {
    #[inline]
    pub fn flipped(self) -> Strand {
        match self {
            Strand::Fwd => Strand::Rev,
            Strand::Rev => Strand::Fwd,
        }
    }

    #[inline]
    pub fn is_forward(self) -> bool {
        self == Strand::Fwd
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Strand::Fwd => write!(f, "+"),
            Strand::Rev => write!(f, "-"),
        }
    }
}

/// A half-open interval on one strand of a sequence, in signed coordinates.
///
/// `beg < end` always. A non-negative pair lies on the forward strand; a
/// negative pair lies on the reverse strand, where signed coordinate `s`
/// corresponds to forward-strand coordinate `s + seqLen` (the LAST
/// convention: a reverse-strand start `x` becomes `x - seqLen`).
///
/// All strand changes go through [`Span::flipped`]; code outside this type
/// never negates endpoints directly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Span {
    pub beg: i64,
    pub end: i64,
}

impl Span {
    #[inline]
    pub fn new(beg: i64, end: i64) -> Span {
        debug_assert!(beg <= end);
        Span { beg, end }
    }

    #[inline]
    pub fn strand(self) -> Strand {
        if self.beg < 0 { Strand::Rev } else { Strand::Fwd }
    }

    /// The same interval seen from the other strand. Involutive.
    #[inline]
    pub fn flipped(self) -> Span {
        Span {
            beg: -self.end,
            end: -self.beg,
        }
    }

    /// The absolute forward-strand interval `(beg, end)` this span covers.
    #[inline]
    pub fn forward(self) -> (i64, i64) {
        if self.beg < 0 { (-self.end, -self.beg) } else { (self.beg, self.end) }
    }

    #[inline]
    pub fn len(self) -> i64 {
        self.end - self.beg
    }
}

/// A gap-free fragment of one alignment.
///
/// `id` is globally unique in input order. The query span is kept oriented
/// onto the forward query strand, so the reference span's sign carries the
/// relative strand of the alignment.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SubAln {
    pub id: usize,
    pub qry: Span,
    pub ref_name: String,
    pub rf: Span,
}

impl SubAln {
    /// The strand of the reference relative to the (forward-oriented) query.
    #[inline]
    pub fn rel_strand(&self) -> Strand {
        if self.qry.strand() == self.rf.strand() { Strand::Fwd } else { Strand::Rev }
    }

    /// Both spans seen from the other strand.
    pub fn flipped(&self) -> SubAln {
        SubAln {
            id: self.id,
            qry: self.qry.flipped(),
            ref_name: self.ref_name.clone(),
            rf: self.rf.flipped(),
        }
    }
}

/// The rearrangement type of a query, in fixed priority order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RearrType {
    InterChrom,
    InterStrand,
    NonColinear,
    BigGap,
}

impl RearrType {
    pub const ALL: [RearrType; 4] = [
        RearrType::InterChrom,
        RearrType::InterStrand,
        RearrType::NonColinear,
        RearrType::BigGap,
    ];

    pub fn letter(self) -> char {
        match self {
            RearrType::InterChrom => 'C',
            RearrType::InterStrand => 'S',
            RearrType::NonColinear => 'N',
            RearrType::BigGap => 'G',
        }
    }
}

/// The set of rearrangement types enabled on the command line.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TypeSet(u8);

impl TypeSet {
    pub fn from_letters(letters: &str) -> Option<TypeSet> {
        let mut mask = 0u8;
        for c in letters.chars() {
            let t = RearrType::ALL.iter().position(|t| t.letter() == c)?;
            mask |= 1 << t;
        }
        if mask == 0 { None } else { Some(TypeSet(mask)) }
    }

    pub fn only(t: RearrType) -> TypeSet {
        TypeSet(1 << RearrType::ALL.iter().position(|x| *x == t).unwrap())
    }

    #[inline]
    pub fn contains(self, t: RearrType) -> bool {
        self.0 & (1 << RearrType::ALL.iter().position(|x| *x == t).unwrap()) != 0
    }
}

/// The raw input text of one alignment, kept for faithful re-emission.
#[derive(Clone, Debug)]
pub enum AlnBlock {
    /// The lines of one pairwise (MAF) block.
    Pairwise(Vec<String>),
    /// One tabular row.
    Tabular(String),
    /// A shrunk row: the text is regenerated from the sub-alignments.
    Shrunk,
}

/// One query sequence with all of its alignments.
#[derive(Clone, Debug)]
pub struct ReadAln {
    /// 1-based index of the case file this query came from; 0 for controls.
    pub file_index: usize,
    pub name: String,
    pub length: i64,
    /// Gap-free fragments, query-forward oriented, sorted by query position.
    pub parts: Vec<SubAln>,
    pub kind: Option<RearrType>,
    pub blocks: Vec<AlnBlock>,
}

impl ReadAln {
    /// Total aligned query length, the tiebreak quality used by the clumper.
    pub fn aligned_len(&self) -> i64 {
        self.parts.iter().map(|p| p.qry.len()).sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn span_flip_is_involutive() {
        let s = Span::new(10, 20);
        assert_eq!(s.flipped(), Span::new(-20, -10));
        assert_eq!(s.flipped().flipped(), s);
        assert_eq!(s.strand(), Strand::Fwd);
        assert_eq!(s.flipped().strand(), Strand::Rev);
    }

    #[test]
    fn span_forward_projection() {
        assert_eq!(Span::new(10, 20).forward(), (10, 20));
        assert_eq!(Span::new(-90, -60).forward(), (60, 90));
    }

    #[test]
    fn canonical_and_known_chroms() {
        assert_eq!(canonical_chrom("chr1_KI270762v1_alt"), "chr1");
        assert_eq!(canonical_chrom("chr7"), "chr7");
        assert!(is_known_chrom("chr7"));
        assert!(!is_known_chrom("chrUn_KI270302v1"));
        assert!(!is_known_chrom("Un_scaffold12"));
        assert!(is_circular_chrom("chrM"));
        assert!(is_circular_chrom("M"));
        assert!(!is_circular_chrom("chr1"));
    }

    #[test]
    fn type_set_letters() {
        let all = TypeSet::from_letters("CSNG").unwrap();
        for t in RearrType::ALL {
            assert!(all.contains(t));
        }

        let cs = TypeSet::from_letters("CS").unwrap();
        assert!(cs.contains(RearrType::InterChrom));
        assert!(!cs.contains(RearrType::BigGap));

        assert!(TypeSet::from_letters("CX").is_none());
        assert!(TypeSet::from_letters("").is_none());
    }
}
