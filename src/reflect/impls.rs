use super::*;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap, VecDeque};

macro_rules! scalar {
    ($t:ty => $kind:ident, $s:ident => $view:expr) => {
	impl Typed for $t {
	    fn type_info() -> TypeInfo {
		TypeInfo::Scalar(ScalarKind::$kind)
	    }

	    fn view(&self) -> ReflectRef<'_> {
		let $s = self;
		ReflectRef::Scalar($view)
	    }
	}
    };
}

scalar!(bool => Bool, x => Scalar::Bool(*x));
scalar!(i32 => Int, x => Scalar::Int(*x));
scalar!(i64 => Long, x => Scalar::Long(*x));
scalar!(u64 => ULong, x => Scalar::ULong(*x));
scalar!(f64 => Double, x => Scalar::Double(*x));
scalar!(String => String, x => Scalar::Str(x.as_str()));

macro_rules! primitive {
    ($( $t:ty ),*) => {
	$(
	impl Typed for $t {
	    fn type_info() -> TypeInfo {
		TypeInfo::Primitive
	    }

	    fn view(&self) -> ReflectRef<'_> {
		ReflectRef::Primitive
	    }
	}
	)*
    };
}

primitive!(u8, i8, i16, u16, u32, usize, isize, f32, char, NaiveDateTime);

fn collect<T: Typed>(items: Vec<Box<dyn Reflect>>) -> Result<Vec<T>, TypeMismatch> {
    items.into_iter().map(T::from_reflect).collect()
}

fn vec_from_items<T: Typed>(items: Vec<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>, TypeMismatch> {
    Ok(Box::new(collect::<T>(items)?))
}

fn deque_from_items<T: Typed>(
    items: Vec<Box<dyn Reflect>>,
) -> Result<Box<dyn Reflect>, TypeMismatch> {
    Ok(Box::new(collect::<T>(items)?.into_iter().collect::<VecDeque<T>>()))
}

fn array_from_items<T: Typed, const N: usize>(
    items: Vec<Box<dyn Reflect>>,
) -> Result<Box<dyn Reflect>, TypeMismatch> {
    let found = items.len();
    let arr: [T; N] = collect::<T>(items)?
        .try_into()
        .map_err(|_| TypeMismatch::Length {
            expected: N,
            found,
            target: std::any::type_name::<[T; N]>().to_string(),
        })?;
    Ok(Box::new(arr))
}

impl<T: Typed> Typed for Vec<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::Seq(SeqInfo {
            element: TypeRef::of::<T>(),
            fixed_len: None,
            from_items: vec_from_items::<T>,
        })
    }

    fn view(&self) -> ReflectRef<'_> {
        ReflectRef::Seq(Box::new(self.iter().map(|x| x as &dyn Reflect)))
    }
}

impl<T: Typed> Typed for VecDeque<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::Seq(SeqInfo {
            element: TypeRef::of::<T>(),
            fixed_len: None,
            from_items: deque_from_items::<T>,
        })
    }

    fn view(&self) -> ReflectRef<'_> {
        ReflectRef::Seq(Box::new(self.iter().map(|x| x as &dyn Reflect)))
    }
}

impl<T: Typed, const N: usize> Typed for [T; N] {
    fn type_info() -> TypeInfo {
        TypeInfo::Seq(SeqInfo {
            element: TypeRef::of::<T>(),
            fixed_len: Some(N),
            from_items: array_from_items::<T, N>,
        })
    }

    fn view(&self) -> ReflectRef<'_> {
        ReflectRef::Seq(Box::new(self.iter().map(|x| x as &dyn Reflect)))
    }
}

/// String keyed maps: usable as map targets and as an object's extras.
pub trait StringMap: Typed + Default {
    /// The value type.
    type Value: Typed;

    /// Insert, replacing any previous value under `key`.
    fn insert_entry(&mut self, key: String, value: Self::Value);
}

fn map_from_entries<M: StringMap>(
    entries: Vec<(String, Box<dyn Reflect>)>,
) -> Result<Box<dyn Reflect>, TypeMismatch> {
    let mut map = M::default();
    for (k, v) in entries {
        map.insert_entry(k, M::Value::from_reflect(v)?);
    }
    Ok(Box::new(map))
}

macro_rules! string_map {
    ($map:ident) => {
	impl<V: Typed> StringMap for $map<String, V> {
	    type Value = V;

	    fn insert_entry(&mut self, key: String, value: V) {
		self.insert(key, value);
	    }
	}

	impl<V: Typed> Typed for $map<String, V> {
	    fn type_info() -> TypeInfo {
		TypeInfo::Map(MapInfo {
		    value: TypeRef::of::<V>(),
		    from_entries: map_from_entries::<Self>,
		})
	    }

	    fn view(&self) -> ReflectRef<'_> {
		ReflectRef::Map(Box::new(
		    self.iter().map(|(k, v)| (k.as_str(), v as &dyn Reflect)),
		))
	    }
	}
    };
}

string_map!(HashMap);
string_map!(BTreeMap);
string_map!(IndexMap);

fn none_of<T: Typed>() -> Box<dyn Reflect> {
    Box::new(Option::<T>::None)
}

impl<T: Typed> Typed for Option<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::Nullable(NullableInfo {
            inner: TypeRef::of::<T>(),
            none: none_of::<T>,
        })
    }

    fn view(&self) -> ReflectRef<'_> {
        ReflectRef::Nullable(self.as_ref().map(|x| x as &dyn Reflect))
    }

    fn from_reflect(value: Box<dyn Reflect>) -> Result<Self, TypeMismatch> {
        if value.as_any().is::<Self>() {
            downcast(value)
        } else {
            T::from_reflect(value).map(Some)
        }
    }
}

impl Typed for Doc {
    fn type_info() -> TypeInfo {
        TypeInfo::Doc
    }

    fn view(&self) -> ReflectRef<'_> {
        ReflectRef::Doc(self)
    }
}

/// A polymorphic slot: holds a value of any [`Typed`] type.
///
/// With type hinting enabled, a `Dynamic` whose content is not itself a `Dynamic` is written
/// inside a type-hint envelope naming the concrete type, and the envelope is honoured when
/// reading it back. Without an envelope, a `Dynamic` reads as the natural value of the JSON:
/// a native scalar for numbers, strings, and booleans, and a [`Doc`] otherwise.
///
/// # Example
/// ```rust
/// # use jsonmap::*;
/// let d = Dynamic::new(3u8);
/// assert!(d.is::<u8>());
/// assert_eq!(d.downcast_ref::<u8>(), Some(&3));
/// ```
pub struct Dynamic(pub Box<dyn Reflect>);

impl Dynamic {
    /// Wrap a value.
    pub fn new<T: Typed>(value: T) -> Self {
        Dynamic(Box::new(value))
    }

    /// Is the content a `T`.
    pub fn is<T: Typed>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    /// Borrow the content as a `T`.
    pub fn downcast_ref<T: Typed>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Take the content out as a `T`.
    pub fn downcast<T: Typed>(self) -> Result<T, TypeMismatch> {
        downcast(self.0)
    }

    /// The content's type.
    pub fn content_key(&self) -> TypeKey {
        self.0.reflect_key()
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dynamic({})", self.0.reflect_key())
    }
}

impl Typed for Dynamic {
    fn type_info() -> TypeInfo {
        TypeInfo::Dynamic
    }

    fn view(&self) -> ReflectRef<'_> {
        ReflectRef::Indirect(self.0.as_ref())
    }

    fn from_reflect(value: Box<dyn Reflect>) -> Result<Self, TypeMismatch> {
        if value.as_any().is::<Dynamic>() {
            downcast(value)
        } else {
            Ok(Dynamic(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(v: Vec<i32>) -> Vec<Box<dyn Reflect>> {
        v.into_iter()
            .map(|x| Box::new(x) as Box<dyn Reflect>)
            .collect()
    }

    #[test]
    fn fixed_arrays_check_length() {
        let info = match <[i32; 2]>::type_info() {
            TypeInfo::Seq(info) => info,
            _ => panic!("not a sequence"),
        };
        assert_eq!(info.fixed_len, Some(2));

        let arr = (info.from_items)(items(vec![1, 2])).unwrap();
        assert_eq!(downcast::<[i32; 2]>(arr), Ok([1, 2]));

        match (info.from_items)(items(vec![1, 2, 3])) {
            Err(TypeMismatch::Length {
                expected, found, ..
            }) => assert_eq!((expected, found), (2, 3)),
            _ => panic!("expected a length mismatch"),
        }
    }

    #[test]
    fn option_adapts_inner_values() {
        assert_eq!(Option::<i32>::from_reflect(Box::new(4i32)), Ok(Some(4)));
        assert_eq!(
            Option::<i32>::from_reflect(Box::new(Option::<i32>::None)),
            Ok(None)
        );
        assert!(Option::<i32>::from_reflect(Box::new(true)).is_err());
    }

    #[test]
    fn dynamic_wraps_anything() {
        let d = Dynamic::from_reflect(Box::new(1.5f64)).unwrap();
        assert!(d.is::<f64>());

        let again = Dynamic::from_reflect(Box::new(d)).unwrap();
        assert!(again.is::<f64>());
        assert_eq!(again.downcast::<f64>(), Ok(1.5));
    }

    #[test]
    fn map_views() {
        let mut m: IndexMap<String, i32> = IndexMap::new();
        m.insert_entry("a".to_string(), 1i32);
        m.insert_entry("b".to_string(), 2i32);
        let keys: Vec<_> = match m.view() {
            ReflectRef::Map(entries) => entries.map(|(k, _)| k.to_string()).collect(),
            _ => panic!("not a map"),
        };
        assert_eq!(keys, vec!["a", "b"]);
    }
}
