use crate::tag_processor::ParsingNamespace;

/// Attribute name as it is adjusted when the element is in `namespace`.
///
/// HTML attributes are lowercased. Foreign elements additionally map the
/// `xlink:`, `xml:` and `xmlns` attributes to their namespaced form, restore
/// the camelCase SVG attribute names, and MathML restores `definitionURL`.
///
/// @see https://html.spec.whatwg.org/#adjust-svg-attributes
/// @see https://html.spec.whatwg.org/#adjust-foreign-attributes
pub fn qualified_attribute_name(attribute_name: &[u8], namespace: &ParsingNamespace) -> Box<[u8]> {
    let lower_name = attribute_name.to_ascii_lowercase();

    if *namespace == ParsingNamespace::Html {
        return lower_name.into();
    }

    if let Some(foreign) = foreign_attribute_adjustment(&lower_name) {
        return foreign.into();
    }

    let adjusted = match namespace {
        ParsingNamespace::MathML if lower_name == b"definitionurl" => Some(b"definitionURL".as_slice()),
        ParsingNamespace::Svg => svg_attribute_adjustment(&lower_name),
        _ => None,
    };

    match adjusted {
        Some(adjusted) => adjusted.into(),
        None => lower_name.into(),
    }
}

fn foreign_attribute_adjustment(lower_name: &[u8]) -> Option<&'static [u8]> {
    let adjusted: &[u8] = match lower_name {
        b"xlink:actuate" => b"xlink actuate",
        b"xlink:arcrole" => b"xlink arcrole",
        b"xlink:href" => b"xlink href",
        b"xlink:role" => b"xlink role",
        b"xlink:show" => b"xlink show",
        b"xlink:title" => b"xlink title",
        b"xlink:type" => b"xlink type",
        b"xml:lang" => b"xml lang",
        b"xml:space" => b"xml space",
        b"xmlns" => b"xmlns",
        b"xmlns:xlink" => b"xmlns xlink",
        _ => return None,
    };
    Some(adjusted)
}

fn svg_attribute_adjustment(lower_name: &[u8]) -> Option<&'static [u8]> {
    let adjusted: &[u8] = match lower_name {
        b"attributename" => b"attributeName",
        b"attributetype" => b"attributeType",
        b"basefrequency" => b"baseFrequency",
        b"baseprofile" => b"baseProfile",
        b"calcmode" => b"calcMode",
        b"clippathunits" => b"clipPathUnits",
        b"diffuseconstant" => b"diffuseConstant",
        b"edgemode" => b"edgeMode",
        b"filterunits" => b"filterUnits",
        b"glyphref" => b"glyphRef",
        b"gradienttransform" => b"gradientTransform",
        b"gradientunits" => b"gradientUnits",
        b"kernelmatrix" => b"kernelMatrix",
        b"kernelunitlength" => b"kernelUnitLength",
        b"keypoints" => b"keyPoints",
        b"keysplines" => b"keySplines",
        b"keytimes" => b"keyTimes",
        b"lengthadjust" => b"lengthAdjust",
        b"limitingconeangle" => b"limitingConeAngle",
        b"markerheight" => b"markerHeight",
        b"markerunits" => b"markerUnits",
        b"markerwidth" => b"markerWidth",
        b"maskcontentunits" => b"maskContentUnits",
        b"maskunits" => b"maskUnits",
        b"numoctaves" => b"numOctaves",
        b"pathlength" => b"pathLength",
        b"patterncontentunits" => b"patternContentUnits",
        b"patterntransform" => b"patternTransform",
        b"patternunits" => b"patternUnits",
        b"pointsatx" => b"pointsAtX",
        b"pointsaty" => b"pointsAtY",
        b"pointsatz" => b"pointsAtZ",
        b"preservealpha" => b"preserveAlpha",
        b"preserveaspectratio" => b"preserveAspectRatio",
        b"primitiveunits" => b"primitiveUnits",
        b"refx" => b"refX",
        b"refy" => b"refY",
        b"repeatcount" => b"repeatCount",
        b"repeatdur" => b"repeatDur",
        b"requiredextensions" => b"requiredExtensions",
        b"requiredfeatures" => b"requiredFeatures",
        b"specularconstant" => b"specularConstant",
        b"specularexponent" => b"specularExponent",
        b"spreadmethod" => b"spreadMethod",
        b"startoffset" => b"startOffset",
        b"stddeviation" => b"stdDeviation",
        b"stitchtiles" => b"stitchTiles",
        b"surfacescale" => b"surfaceScale",
        b"systemlanguage" => b"systemLanguage",
        b"tablevalues" => b"tableValues",
        b"targetx" => b"targetX",
        b"targety" => b"targetY",
        b"textlength" => b"textLength",
        b"viewbox" => b"viewBox",
        b"viewtarget" => b"viewTarget",
        b"xchannelselector" => b"xChannelSelector",
        b"ychannelselector" => b"yChannelSelector",
        b"zoomandpan" => b"zoomAndPan",
        _ => return None,
    };
    Some(adjusted)
}
