use super::Member;

/// What a finder asks the enumeration to do after inspecting a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Step {
    /// Exclude the candidate from every later finder and pass.
    pub consume: bool,
    /// End the whole pass.
    pub stop: bool,
}

impl Step {
    pub const CONTINUE: Step = Step {
        consume: false,
        stop: false,
    };
    pub const STOP: Step = Step {
        consume: false,
        stop: true,
    };
    pub const CLAIM: Step = Step {
        consume: true,
        stop: true,
    };
}

/// One strategy in a resolution chain.
pub trait MemberFinder {
    fn handle(&mut self, index: usize, member: &Member) -> Step;
}

/// Candidate members plus the claimed markers that persist across passes.
///
/// A pass offers every unclaimed candidate, in declaration order, to each finder
/// of the chain in order. A claimed candidate is skipped by the rest of the chain
/// and by all later passes over the same set.
#[derive(Debug, Clone)]
pub struct MemberSet<'m> {
    members: &'m [Member],
    claimed: Vec<bool>,
    skip_ignored: bool,
}

impl<'m> MemberSet<'m> {
    /// Candidates with ignored members left out.
    #[must_use]
    pub fn new(members: &'m [Member]) -> Self {
        Self {
            members,
            claimed: vec![false; members.len()],
            skip_ignored: true,
        }
    }

    /// Candidates including ignored members, for callers that inspect the tag themselves.
    #[must_use]
    pub fn including_ignored(members: &'m [Member]) -> Self {
        Self {
            skip_ignored: false,
            ..Self::new(members)
        }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> &'m Member {
        &self.members[index]
    }

    #[must_use]
    pub fn is_claimed(&self, index: usize) -> bool {
        self.claimed[index]
    }

    pub fn claim(&mut self, index: usize) {
        self.claimed[index] = true;
    }

    /// Run one pass of `chain` over the eligible candidates.
    pub fn enumerate(&mut self, chain: &mut [&mut dyn MemberFinder]) {
        for (index, member) in self.members.iter().enumerate() {
            if self.claimed[index] || (self.skip_ignored && member.ignore) {
                continue;
            }
            for finder in chain.iter_mut() {
                let step = finder.handle(index, member);
                if step.consume {
                    self.claimed[index] = true;
                }
                if step.stop {
                    return;
                }
                if self.claimed[index] {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueType;

    static FIELDS: &[Member] = &[
        Member::field("a", ValueType::Long),
        Member::field("b", ValueType::Long).with_ignore(),
        Member::field("c", ValueType::Long),
    ];

    /// Records every index it sees and answers with a fixed step on one name.
    struct Probe {
        seen: Vec<usize>,
        target: &'static str,
        answer: Step,
    }

    impl MemberFinder for Probe {
        fn handle(&mut self, index: usize, member: &Member) -> Step {
            self.seen.push(index);
            if member.name == self.target {
                self.answer
            } else {
                Step::CONTINUE
            }
        }
    }

    fn probe(target: &'static str, answer: Step) -> Probe {
        Probe {
            seen: Vec::new(),
            target,
            answer,
        }
    }

    #[test]
    fn ignored_members_are_skipped_unless_asked_for() {
        let mut p = probe("", Step::CONTINUE);
        MemberSet::new(FIELDS).enumerate(&mut [&mut p]);
        assert_eq!(p.seen, vec![0, 2]);

        let mut p = probe("", Step::CONTINUE);
        MemberSet::including_ignored(FIELDS).enumerate(&mut [&mut p]);
        assert_eq!(p.seen, vec![0, 1, 2]);
    }

    #[test]
    fn stop_ends_the_pass_for_every_finder() {
        let mut first = probe("a", Step::STOP);
        let mut second = probe("", Step::CONTINUE);
        MemberSet::new(FIELDS).enumerate(&mut [&mut first, &mut second]);
        assert_eq!(first.seen, vec![0]);
        assert!(second.seen.is_empty());
    }

    #[test]
    fn consumed_members_skip_later_finders_and_passes() {
        let consume_only = Step {
            consume: true,
            stop: false,
        };
        let mut set = MemberSet::new(FIELDS);
        let mut first = probe("a", consume_only);
        let mut second = probe("", Step::CONTINUE);
        set.enumerate(&mut [&mut first, &mut second]);
        assert_eq!(first.seen, vec![0, 2]);
        assert_eq!(second.seen, vec![2]);
        assert!(set.is_claimed(0));

        let mut later = probe("", Step::CONTINUE);
        set.enumerate(&mut [&mut later]);
        assert_eq!(later.seen, vec![2]);
    }

    #[test]
    fn explicit_claims_persist() {
        let mut set = MemberSet::new(FIELDS);
        set.claim(2);
        let mut p = probe("", Step::CONTINUE);
        set.enumerate(&mut [&mut p]);
        assert_eq!(p.seen, vec![0]);
        assert_eq!(set.get(2).name, "c");
    }
}
