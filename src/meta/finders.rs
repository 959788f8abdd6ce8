//! Finder strategies for [`MemberSet::enumerate`](super::MemberSet::enumerate).
//!
//! Each finder remembers the index of the member it settled on in `matched`.

use super::enumerator::{MemberFinder, Step};
use super::{Member, MemberKind};

fn names_match(a: &str, b: &str, ignore_case: bool) -> bool {
    if ignore_case {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

/// Field with a given name. Keeps the first match and lets the pass continue.
#[derive(Debug, Clone)]
pub struct FieldByName {
    name: String,
    ignore_case: bool,
    pub matched: Option<usize>,
}

impl FieldByName {
    #[must_use]
    pub fn exact(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ignore_case: false,
            matched: None,
        }
    }

    #[must_use]
    pub fn ignoring_case(name: &str) -> Self {
        Self {
            ignore_case: true,
            ..Self::exact(name)
        }
    }
}

impl MemberFinder for FieldByName {
    fn handle(&mut self, index: usize, member: &Member) -> Step {
        if self.matched.is_none()
            && member.kind == MemberKind::Field
            && names_match(member.name, &self.name, self.ignore_case)
        {
            self.matched = Some(index);
        }
        Step::CONTINUE
    }
}

/// Field whose column tag equals a column name (case-insensitive). Claims it.
#[derive(Debug, Clone)]
pub struct FieldByColumn {
    column: String,
    pub matched: Option<usize>,
}

impl FieldByColumn {
    #[must_use]
    pub fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
            matched: None,
        }
    }
}

impl MemberFinder for FieldByColumn {
    fn handle(&mut self, index: usize, member: &Member) -> Step {
        match member.column_tag() {
            Some(tag) if member.kind == MemberKind::Field && tag.eq_ignore_ascii_case(&self.column) => {
                self.matched = Some(index);
                Step::CLAIM
            }
            _ => Step::CONTINUE,
        }
    }
}

/// Field tagged as identifier.
#[derive(Debug, Clone, Default)]
pub struct FieldById {
    pub matched: Option<usize>,
}

impl MemberFinder for FieldById {
    fn handle(&mut self, index: usize, member: &Member) -> Step {
        if member.kind == MemberKind::Field && member.id.is_some() {
            self.matched = Some(index);
            Step::STOP
        } else {
            Step::CONTINUE
        }
    }
}

/// Accessor whose column tag equals a column name (case-insensitive). Claims it.
#[derive(Debug, Clone)]
pub struct GetterByColumn {
    column: String,
    pub matched: Option<usize>,
}

impl GetterByColumn {
    #[must_use]
    pub fn new(column: &str) -> Self {
        Self {
            column: column.to_string(),
            matched: None,
        }
    }
}

impl MemberFinder for GetterByColumn {
    fn handle(&mut self, index: usize, member: &Member) -> Step {
        match member.column_tag() {
            Some(tag)
                if member.kind == MemberKind::Getter && tag.eq_ignore_ascii_case(&self.column) =>
            {
                self.matched = Some(index);
                Step::CLAIM
            }
            _ => Step::CONTINUE,
        }
    }
}

/// Accessor tagged as identifier.
#[derive(Debug, Clone, Default)]
pub struct GetterById {
    pub matched: Option<usize>,
}

impl MemberFinder for GetterById {
    fn handle(&mut self, index: usize, member: &Member) -> Step {
        if member.kind == MemberKind::Getter && member.id.is_some() {
            self.matched = Some(index);
            Step::STOP
        } else {
            Step::CONTINUE
        }
    }
}

/// Accessor whose synthesized name matches a parameter name (case-insensitive). Claims it.
#[derive(Debug, Clone)]
pub struct GetterByParam {
    param: String,
    pub matched: Option<usize>,
}

impl GetterByParam {
    #[must_use]
    pub fn new(param: &str) -> Self {
        Self {
            param: param.to_string(),
            matched: None,
        }
    }
}

impl MemberFinder for GetterByParam {
    fn handle(&mut self, index: usize, member: &Member) -> Step {
        match member.synthesized_name() {
            Some(name) if member.kind == MemberKind::Getter && name.eq_ignore_ascii_case(&self.param) => {
                self.matched = Some(index);
                Step::CLAIM
            }
            _ => Step::CONTINUE,
        }
    }
}

/// Method of a given kind with an exact name.
#[derive(Debug, Clone)]
pub struct MethodByName {
    name: String,
    kind: MemberKind,
    pub matched: Option<usize>,
}

impl MethodByName {
    #[must_use]
    pub fn new(name: &str, kind: MemberKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            matched: None,
        }
    }
}

impl MemberFinder for MethodByName {
    fn handle(&mut self, index: usize, member: &Member) -> Step {
        if member.kind == self.kind && member.name == self.name {
            self.matched = Some(index);
            Step::STOP
        } else {
            Step::CONTINUE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MemberSet;
    use crate::types::ValueType;

    static FIELDS: &[Member] = &[
        Member::field("name", ValueType::Text),
        Member::field("NAME", ValueType::Text),
        Member::field("person_id", ValueType::Long).with_id().with_column("ID"),
        Member::field("born", ValueType::Date).with_column("birth_date"),
    ];

    static METHODS: &[Member] = &[
        Member::getter("get_name", ValueType::Text),
        Member::getter("get_born", ValueType::Date).with_column("birth"),
        Member::setter("set_name", ValueType::Text),
        Member::getter("get_key", ValueType::Long).with_id(),
    ];

    #[test]
    fn name_match_keeps_first_candidate() {
        let mut exact = FieldByName::exact("NAME");
        let mut loose = FieldByName::ignoring_case("NAME");
        MemberSet::new(FIELDS).enumerate(&mut [&mut exact, &mut loose]);
        assert_eq!(exact.matched, Some(1));
        assert_eq!(loose.matched, Some(0));
    }

    #[test]
    fn column_tag_match_claims_and_stops() {
        let mut set = MemberSet::new(FIELDS);
        let mut by_column = FieldByColumn::new("BIRTH_DATE");
        let mut by_name = FieldByName::exact("born");
        set.enumerate(&mut [&mut by_column, &mut by_name]);
        assert_eq!(by_column.matched, Some(3));
        assert_eq!(by_name.matched, None);
        assert!(set.is_claimed(3));
    }

    #[test]
    fn id_finders_stop_at_first_tagged_member() {
        let mut by_id = FieldById::default();
        let mut by_name = FieldByName::ignoring_case("id");
        MemberSet::new(FIELDS).enumerate(&mut [&mut by_id, &mut by_name]);
        assert_eq!(by_id.matched, Some(2));

        let mut getter = GetterById::default();
        MemberSet::new(METHODS).enumerate(&mut [&mut getter]);
        assert_eq!(getter.matched, Some(3));
    }

    #[test]
    fn getter_finders_only_see_getters() {
        let mut by_column = GetterByColumn::new("birth");
        let mut by_param = GetterByParam::new("Name");
        MemberSet::new(METHODS).enumerate(&mut [&mut by_column]);
        MemberSet::new(METHODS).enumerate(&mut [&mut by_param]);
        assert_eq!(by_column.matched, Some(1));
        assert_eq!(by_param.matched, Some(0));

        let mut setter = MethodByName::new("set_name", MemberKind::Setter);
        let mut wrong_kind = MethodByName::new("set_name", MemberKind::Getter);
        MemberSet::new(METHODS).enumerate(&mut [&mut setter]);
        MemberSet::new(METHODS).enumerate(&mut [&mut wrong_kind]);
        assert_eq!(setter.matched, Some(2));
        assert_eq!(wrong_kind.matched, None);
    }
}
