//! The built-in coercion tables.
use super::registry::{exporter, importer, ExporterFn, ImportSource, ImporterFn, SourceKind};
use crate::error::TypeMismatch;
use crate::reflect::Typed;
use chrono::{NaiveDate, NaiveDateTime};
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt::Display;

const ISO_DATETIME: &str = "%Y-%m-%dT%H:%M:%S%.f";
const ISO_DATE: &str = "%Y-%m-%d";

pub(crate) fn exporters(date_format: &str) -> HashMap<TypeId, ExporterFn> {
    let mut t = HashMap::new();

    macro_rules! widened {
        ($method:ident as $wide:ty: $( $t:ty ),*) => {
	    $(
	    t.insert(
		TypeId::of::<$t>(),
		exporter(|x: &$t, w: &mut crate::Writer| Ok(w.$method(*x as $wide)?)),
	    );
	    )*
        };
    }

    widened!(write_i32 as i32: u8, i8, i16, u16);
    widened!(write_u64 as u64: u32, usize);
    widened!(write_i64 as i64: isize);
    t.insert(
        TypeId::of::<f32>(),
        exporter(|x: &f32, w: &mut crate::Writer| Ok(w.write_f32(*x)?)),
    );
    t.insert(
        TypeId::of::<char>(),
        exporter(|x: &char, w: &mut crate::Writer| {
            let mut buf = [0u8; 4];
            Ok(w.write_str(x.encode_utf8(&mut buf))?)
        }),
    );
    let fmt = date_format.to_string();
    t.insert(
        TypeId::of::<NaiveDateTime>(),
        exporter(move |x: &NaiveDateTime, w: &mut crate::Writer| {
            Ok(w.write_str(&x.format(&fmt).to_string())?)
        }),
    );

    t
}

fn checked<S, T>() -> ImporterFn
where
    S: ImportSource + Copy + Display,
    T: Typed + TryFrom<S>,
{
    importer(|x: S| {
        T::try_from(x).map_err(|_| TypeMismatch::Overflow {
            literal: x.to_string(),
            target: type_name::<T>().to_string(),
        })
    })
}

fn parse_datetime(s: &str, fmt: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, fmt)
        .or_else(|_| NaiveDateTime::parse_from_str(s, ISO_DATETIME))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, ISO_DATE)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn unparsable<T>(s: String) -> TypeMismatch {
    TypeMismatch::Scalar {
        literal: s,
        kind: SourceKind::String.to_string(),
        target: type_name::<T>().to_string(),
    }
}

pub(crate) fn importers(date_format: &str) -> HashMap<(SourceKind, TypeId), ImporterFn> {
    let mut t = HashMap::new();

    macro_rules! integral {
        ($src:ty => $kind:ident: $( $t:ty ),*) => {
	    $(
	    t.insert((SourceKind::$kind, TypeId::of::<$t>()), checked::<$src, $t>());
	    )*
	    t.insert(
		(SourceKind::$kind, TypeId::of::<f32>()),
		importer(|x: $src| Ok(x as f32)),
	    );
	    t.insert(
		(SourceKind::$kind, TypeId::of::<f64>()),
		importer(|x: $src| Ok(x as f64)),
	    );
        };
    }

    integral!(i32 => Int: u8, i8, i16, u16, u32, u64, usize, isize, i64);
    integral!(i64 => Long: u8, i8, i16, u16, i32, u32, u64, usize, isize);
    integral!(u64 => ULong: usize);

    t.insert(
        (SourceKind::Double, TypeId::of::<f32>()),
        importer(|x: f64| {
            let n = x as f32;
            if n.is_finite() {
                Ok(n)
            } else {
                Err(TypeMismatch::Overflow {
                    literal: x.to_string(),
                    target: String::from("f32"),
                })
            }
        }),
    );
    t.insert(
        (SourceKind::String, TypeId::of::<char>()),
        importer(|s: String| {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(unparsable::<char>(s)),
            }
        }),
    );
    let fmt = date_format.to_string();
    t.insert(
        (SourceKind::String, TypeId::of::<NaiveDateTime>()),
        importer(move |s: String| {
            parse_datetime(&s, &fmt).ok_or_else(|| unparsable::<NaiveDateTime>(s))
        }),
    );

    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;
    use crate::reflect::Reflect;

    fn import<T: Typed>(kind: SourceKind, value: Box<dyn Reflect>) -> crate::Result<T> {
        let table = importers("%m/%d/%Y %H:%M:%S");
        let f = table
            .get(&(kind, TypeId::of::<T>()))
            .expect("no base importer");
        let v = f(value)?;
        Ok(T::from_reflect(v)?)
    }

    #[test]
    fn narrowing_is_checked() {
        assert_eq!(import::<u8>(SourceKind::Int, Box::new(255i32)), Ok(255));
        assert_eq!(
            import::<u8>(SourceKind::Int, Box::new(256i32)),
            Err(MapError::TypeMismatch(TypeMismatch::Overflow {
                literal: "256".into(),
                target: "u8".into()
            }))
        );
        assert!(import::<u32>(SourceKind::Int, Box::new(-1i32)).is_err());
        assert_eq!(
            import::<u64>(SourceKind::Long, Box::new(1i64 << 40)),
            Ok(1 << 40)
        );
        assert_eq!(import::<f64>(SourceKind::Int, Box::new(3i32)), Ok(3.0));
        assert!(import::<f32>(SourceKind::Double, Box::new(1e300f64)).is_err());
    }

    #[test]
    fn strings() {
        assert_eq!(
            import::<char>(SourceKind::String, Box::new(String::from("é"))),
            Ok('é')
        );
        assert!(import::<char>(SourceKind::String, Box::new(String::from("ab"))).is_err());

        let expected = NaiveDate::from_ymd_opt(2020, 2, 29)
            .and_then(|d| d.and_hms_opt(13, 5, 0))
            .unwrap();
        for s in ["02/29/2020 13:05:00", "2020-02-29T13:05:00"] {
            assert_eq!(
                import::<NaiveDateTime>(SourceKind::String, Box::new(String::from(s))),
                Ok(expected)
            );
        }
        assert_eq!(
            import::<NaiveDateTime>(SourceKind::String, Box::new(String::from("2020-02-29"))),
            Ok(expected.date().and_hms_opt(0, 0, 0).unwrap())
        );
        assert!(
            import::<NaiveDateTime>(SourceKind::String, Box::new(String::from("soon"))).is_err()
        );
    }

    #[test]
    fn exporters_write_widened() {
        let table = exporters("%Y");
        let mut w = crate::Writer::new();
        w.write_array_start().unwrap();
        for v in [&7u8 as &dyn Reflect, &-2i16, &u32::MAX, &'x', &1.5f32] {
            let f = table.get(&v.reflect_key().id()).unwrap();
            f(v, &mut w).unwrap();
        }
        w.write_array_end().unwrap();
        assert_eq!(w.as_str(), r#"[7,-2,4294967295,"x",1.5]"#);
    }
}
